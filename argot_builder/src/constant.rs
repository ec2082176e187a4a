/// Reserved text meaning "bind to the implicit pipeline input".
pub(crate) const FILE_TOPIC: &str = "-";
/// Key under which a captured tail is published.
pub(crate) const TAIL_KEY: &str = "...";
/// Key under which every positional value is published, in argument order.
pub(crate) const POSITIONAL_ARRAY_KEY: &str = "$";
pub(crate) const POSITIONAL_KEY_PREFIX: &str = "$";
pub(crate) const NEGATION_PREFIX: &str = "no-";
pub(crate) const BOOLEAN_TYPE: &str = "Boolean";
pub(crate) const COUNT_TYPE: &str = "Count";
