pub mod helpers;
pub mod providers;
