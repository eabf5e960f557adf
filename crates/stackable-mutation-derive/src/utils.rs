use convert_case::{Case, Casing};
use darling::FromMeta;
use syn::{Ident, Path, parse_quote};

#[derive(FromMeta)]
pub struct PathOverrides {
    #[darling(default = "PathOverrides::default_mutation")]
    pub mutation: Path,
}

impl Default for PathOverrides {
    fn default() -> Self {
        Self {
            mutation: Self::default_mutation(),
        }
    }
}

impl PathOverrides {
    fn default_mutation() -> Path {
        parse_quote!(::stackable_mutation)
    }
}

/// Returns the name a field is looked up by, e.g. `image_pull_secrets` becomes
/// `ImagePullSecrets` and `r#type` becomes `Type`.
pub fn exported_name(ident: &Ident) -> String {
    ident
        .to_string()
        .trim_start_matches("r#")
        .to_case(Case::Pascal)
}
