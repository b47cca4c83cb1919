//! 基础设施层：持有共享资源，只暴露能力

pub mod proxy_rotator;

pub use proxy_rotator::ProxyRotator;
