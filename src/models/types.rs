use std::borrow::Cow;

/// Provider identifier - stable lowercase tokens, mostly static constants
pub type ProviderId = Cow<'static, str>;

/// Currency code (ISO 4217) - mostly static
pub type Currency = Cow<'static, str>;
