use darling::{FromDeriveInput, FromField, ast::Data, util::Ignored};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{DeriveInput, Generics};

use crate::utils::{PathOverrides, exported_name};

#[derive(FromDeriveInput)]
#[darling(attributes(reflect), supports(struct_named))]
pub struct ReflectInput {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, ReflectField>,
    #[darling(default)]
    path_overrides: PathOverrides,
}

#[derive(Debug, FromField)]
#[darling(attributes(reflect))]
struct ReflectField {
    ident: Option<Ident>,
    #[darling(default)]
    rename: Option<String>,
    #[darling(default)]
    skip: bool,
}

pub fn derive(input: DeriveInput) -> TokenStream {
    let ReflectInput {
        ident,
        generics,
        data,
        path_overrides: PathOverrides {
            mutation: mutation_mod,
        },
    } = match ReflectInput::from_derive_input(&input) {
        Ok(input) => input,
        Err(err) => return err.write_errors(),
    };
    let fields = match data {
        Data::Enum(_) => {
            return quote! {
                compile_error!("`#[derive(Reflect)]` does not currently support enums");
            };
        }
        Data::Struct(fields) => fields.fields,
    };

    let (field_idents, field_names): (Vec<_>, Vec<_>) = fields
        .iter()
        .filter(|field| !field.skip)
        .filter_map(|field| {
            let ident = field.ident.as_ref()?;
            let name = field
                .rename
                .clone()
                .unwrap_or_else(|| exported_name(ident));
            Some((ident, name))
        })
        .unzip();

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    quote! {
        impl #impl_generics #mutation_mod::reflect::Reflect for #ident #ty_generics #where_clause {
            fn reflect_mut(&mut self) -> #mutation_mod::reflect::ReflectMut<'_> {
                #mutation_mod::reflect::ReflectMut::Struct(self)
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }

        impl #impl_generics #mutation_mod::reflect::Struct for #ident #ty_generics #where_clause {
            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn #mutation_mod::reflect::Reflect> {
                match name {
                    #(
                        #field_names => ::core::option::Option::Some(
                            &mut self.#field_idents as &mut dyn #mutation_mod::reflect::Reflect,
                        ),
                    )*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[#(#field_names),*]
            }
        }
    }
}
