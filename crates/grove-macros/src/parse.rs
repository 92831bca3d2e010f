//! Attribute parsing for the `Shape` derive.
//!
//! `#[shape(..)]` attributes are authoritative. The `rename`, `skip` and
//! `rename_all` keys of `#[serde(..)]` are read too, so the schema matches
//! what serde decodes; all other serde keys are ignored.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use syn::{
    punctuated::Punctuated, spanned::Spanned, Attribute, Expr, ExprLit, Lit, LitStr, Meta, Path,
    Token,
};

/// Where a field is read from, with its external name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Header(String),
    Path(String),
    Query(String),
}

/// serde `rename_all` conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn from_lit(lit: &LitStr) -> syn::Result<Self> {
        Ok(match lit.value().as_str() {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            other => {
                return Err(syn::Error::new(
                    lit.span(),
                    format!("unknown rename rule: {other}"),
                ))
            }
        })
    }

    /// Applies the rule to a snake_case field name.
    pub fn apply(self, field: &str) -> String {
        match self {
            Self::Lower => field.to_lowercase(),
            Self::Upper => field.to_uppercase(),
            Self::Pascal => field.to_upper_camel_case(),
            Self::Camel => field.to_lower_camel_case(),
            Self::Snake => field.to_snake_case(),
            Self::ScreamingSnake => field.to_shouty_snake_case(),
            Self::Kebab => field.to_kebab_case(),
            Self::ScreamingKebab => field.to_shouty_kebab_case(),
        }
    }
}

/// Container-level options.
#[derive(Debug, Default)]
pub struct ContainerAttrs {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub rename_all: Option<RenameRule>,
    pub crate_path: Option<Path>,
    /// `#[serde(default)]` on the container.
    pub serde_default: bool,
}

impl ContainerAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for meta in metas(attrs, "shape")? {
            let key = key_of(&meta)?;
            match key.as_str() {
                "name" => out.name = Some(string_value(&meta)?.value()),
                "content_type" => out.content_type = Some(string_value(&meta)?.value()),
                "rename_all" => out.rename_all = Some(RenameRule::from_lit(&string_value(&meta)?)?),
                "crate" => out.crate_path = Some(string_value(&meta)?.parse()?),
                _ => {
                    return Err(syn::Error::new(
                        meta.span(),
                        format!("unknown shape attribute: {key}"),
                    ))
                }
            }
        }

        for meta in metas(attrs, "serde")? {
            if is_default(&meta) {
                out.serde_default = true;
            }
            if out.rename_all.is_some() {
                continue;
            }
            if let Meta::NameValue(nv) = &meta {
                if nv.path.is_ident("rename_all") {
                    if let Some(lit) = lit_str(&nv.value) {
                        out.rename_all = Some(RenameRule::from_lit(lit)?);
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Field-level options.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub rename: Option<String>,
    pub skip: bool,
    pub location: Option<Location>,
    /// serde leaves the field out of decoding or fills it when absent.
    pub decode_optional: bool,
}

impl FieldAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        let mut shape_skip = false;
        let mut serde_skip = false;

        for meta in metas(attrs, "shape")? {
            let key = key_of(&meta)?;
            let location = match key.as_str() {
                "skip" => {
                    expect_flag(&meta)?;
                    shape_skip = true;
                    continue;
                }
                "rename" => {
                    out.rename = Some(string_value(&meta)?.value());
                    continue;
                }
                "header" => Location::Header(string_value(&meta)?.value()),
                "path" => Location::Path(string_value(&meta)?.value()),
                "query" => Location::Query(string_value(&meta)?.value()),
                _ => {
                    return Err(syn::Error::new(
                        meta.span(),
                        format!("unknown shape attribute: {key}"),
                    ))
                }
            };
            if out.location.is_some() {
                return Err(syn::Error::new(
                    meta.span(),
                    "a field can carry only one of `header`, `path` or `query`",
                ));
            }
            out.location = Some(location);
        }

        for meta in metas(attrs, "serde")? {
            match &meta {
                Meta::Path(path) if path.is_ident("skip") || path.is_ident("skip_deserializing") => {
                    serde_skip = true;
                }
                meta if is_default(meta) => out.decode_optional = true,
                Meta::NameValue(nv) if nv.path.is_ident("rename") && out.rename.is_none() => {
                    out.rename = lit_str(&nv.value).map(LitStr::value);
                }
                _ => {}
            }
        }

        // Parameters are not part of the body, so serde skipping them is expected.
        out.skip = shape_skip || (serde_skip && out.location.is_none());
        out.decode_optional |= serde_skip;
        Ok(out)
    }
}

fn is_default(meta: &Meta) -> bool {
    meta.path().is_ident("default")
}

fn metas(attrs: &[Attribute], ident: &str) -> syn::Result<Vec<Meta>> {
    let mut out = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident(ident)) {
        let list = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        out.extend(list);
    }
    Ok(out)
}

fn key_of(meta: &Meta) -> syn::Result<String> {
    meta.path()
        .get_ident()
        .map(ToString::to_string)
        .ok_or_else(|| syn::Error::new(meta.path().span(), "expected identifier"))
}

fn lit_str(expr: &Expr) -> Option<&LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Some(s),
        _ => None,
    }
}

fn string_value(meta: &Meta) -> syn::Result<LitStr> {
    match meta {
        Meta::NameValue(nv) => lit_str(&nv.value)
            .cloned()
            .ok_or_else(|| syn::Error::new(nv.value.span(), "expected string literal")),
        _ => Err(syn::Error::new(meta.span(), "expected name = \"value\"")),
    }
}

fn expect_flag(meta: &Meta) -> syn::Result<()> {
    match meta {
        Meta::Path(_) => Ok(()),
        _ => Err(syn::Error::new(meta.span(), "expected a bare flag")),
    }
}
