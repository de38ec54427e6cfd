use tch::Device;

/// Configuration for the actor-critic network
#[derive(Debug, Clone)]
pub struct NnConfig {
    /// Width of the shared hidden layer
    pub hidden_size: usize,

    /// Adam learning rate
    pub learning_rate: f64,

    /// Device holding parameters and running the forward pass
    pub device: Device,
}

impl NnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size.max(1);
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

impl Default for NnConfig {
    fn default() -> Self {
        Self {
            hidden_size: 128,
            learning_rate: 1e-3,
            device: Device::Cpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NnConfig::default();
        assert_eq!(config.hidden_size, 128);
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.device, Device::Cpu);
    }

    #[test]
    fn test_builder_pattern() {
        let config = NnConfig::new()
            .with_hidden_size(0)
            .with_learning_rate(0.01)
            .with_device(Device::Cpu);
        assert_eq!(config.hidden_size, 1);
        assert_eq!(config.learning_rate, 0.01);
    }
}
