use darling::{FromDeriveInput, FromField, ast::Data, util::Ignored};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{DeriveInput, Generics};

use crate::utils::PathOverrides;

#[derive(FromDeriveInput)]
#[darling(attributes(defaulter), supports(struct_named))]
pub struct DefaulterInput {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, DefaulterField>,
    #[darling(default)]
    path_overrides: PathOverrides,
}

#[derive(Debug, FromField)]
#[darling(attributes(defaulter))]
struct DefaulterField {
    ident: Option<Ident>,
    #[darling(default)]
    path: Option<String>,
    #[darling(default)]
    skip: bool,
}

pub fn derive(input: DeriveInput) -> TokenStream {
    let DefaulterInput {
        ident,
        generics,
        data,
        path_overrides: PathOverrides {
            mutation: mutation_mod,
        },
    } = match DefaulterInput::from_derive_input(&input) {
        Ok(input) => input,
        Err(err) => return err.write_errors(),
    };
    let fields = match data {
        Data::Enum(_) => {
            return quote! {
                compile_error!("`#[derive(Defaulter)]` does not currently support enums");
            };
        }
        Data::Struct(fields) => fields.fields,
    };

    let collect_fields = fields
        .iter()
        .map(|DefaulterField { ident, path, skip }| match (path, skip) {
            (Some(_), true) => quote! {
                compile_error!("`#[defaulter(path)]` and `#[defaulter(skip)]` are mutually exclusive");
            },
            (Some(path), false) => quote! {
                plan.capture(#path, &self.#ident);
            },
            (None, true) => TokenStream::new(),
            (None, false) => quote! {
                #mutation_mod::overrides::Defaulter::collect_defaults(&self.#ident, plan);
            },
        })
        .collect::<TokenStream>();

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    quote! {
        impl #impl_generics #mutation_mod::overrides::Defaulter for #ident #ty_generics #where_clause {
            fn collect_defaults(&self, plan: &mut #mutation_mod::overrides::OverridePlan) {
                #collect_fields
            }
        }
    }
}
