pub(crate) mod resolve;
pub(crate) mod validate;
pub(crate) mod walk;
