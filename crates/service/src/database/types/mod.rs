mod dbool;
mod dkey;
mod drole;

pub use dbool::DBool;
pub use dkey::DKey;
pub use drole::DRole;
