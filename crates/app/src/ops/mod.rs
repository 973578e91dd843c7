pub mod draw;
pub mod init;
pub mod register;
pub mod round;
pub mod users;
pub mod version;

pub use draw::Draw;
pub use init::Init;
pub use register::Register;
pub use round::Round;
pub use users::Users;
pub use version::Version;
