pub mod generic;
pub mod kind;
pub mod mapper;
pub mod registry;

pub use generic::GenericDeviceMapper;
pub use kind::MapperKind;
pub use mapper::{DeviceMapper, HostContext};
pub use registry::MapperRegistry;
