mod guard;

pub use guard::BasicPageGuard;
pub use guard::ReadPageGuard;
pub use guard::WritePageGuard;
