pub mod fintables;
pub mod logo;
pub mod util;

pub use fintables::FintablesProvider;
pub use logo::LogoStore;
