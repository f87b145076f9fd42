pub mod dispatch;
pub mod exchange;
pub mod identify;
pub mod poller;
pub mod session;
pub mod worker;

#[cfg(test)]
mod testing;

pub use identify::TypeIdentifier;
pub use poller::{Poller, partition};
pub use session::{SessionBuilder, SessionFactory, UdpSessionFactory};
