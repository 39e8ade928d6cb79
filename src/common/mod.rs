pub mod middleware_identity;
