pub mod trait_impl;
pub mod google;

pub use trait_impl::Provider;
pub use google::GoogleProvider;
