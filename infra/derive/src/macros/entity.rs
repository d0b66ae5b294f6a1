use crate::macros::error::single_generic;
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Fields, Ident, ItemStruct, LitStr, Type};

pub fn expand(args: TokenStream, input: ItemStruct) -> TokenStream {
    match expand_inner(args, &input) {
        Ok(entity_impl) => quote! {
            #input
            #entity_impl
        },
        Err(err) => {
            let err = err.to_compile_error();
            quote! {
                #input
                #err
            }
        },
    }
}

fn expand_inner(args: TokenStream, input: &ItemStruct) -> syn::Result<TokenStream> {
    let collection = parse_collection(args, input)?;

    let Fields::Named(fields) = &input.fields else {
        return Err(syn::Error::new_spanned(&input.ident, "entity requires a struct with named fields"));
    };

    let id_field = fields
        .named
        .iter()
        .find(|f| f.ident.as_ref().is_some_and(|i| i == "id"))
        .ok_or_else(|| syn::Error::new_spanned(&input.ident, "entity requires an `id: Option<i64>` field"))?;
    if !is_optional_i64(&id_field.ty) {
        return Err(syn::Error::new_spanned(&id_field.ty, "entity `id` must be Option<i64>"));
    }

    let mut audit_fields = fields.named.iter().filter(|f| is_audit_metadata(&f.ty));
    let audit: &Ident = audit_fields
        .next()
        .and_then(|f| f.ident.as_ref())
        .ok_or_else(|| syn::Error::new_spanned(&input.ident, "entity requires an AuditMetadata field"))?;
    if let Some(extra) = audit_fields.next() {
        return Err(syn::Error::new_spanned(extra, "entity allows exactly one AuditMetadata field"));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::wf_kernel::repository::Entity for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;

            #[inline]
            fn id(&self) -> Option<i64> {
                self.id
            }

            #[inline]
            fn set_id(&mut self, id: i64) {
                self.id = Some(id);
            }

            #[inline]
            fn audit(&self) -> &::wf_kernel::domain::audit::AuditMetadata {
                &self.#audit
            }

            #[inline]
            fn audit_mut(&mut self) -> &mut ::wf_kernel::domain::audit::AuditMetadata {
                &mut self.#audit
            }
        }
    })
}

fn parse_collection(args: TokenStream, input: &ItemStruct) -> syn::Result<LitStr> {
    let mut collection: Option<LitStr> = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("collection") {
            collection = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported entity argument, expected `collection = \"...\"`"))
        }
    });
    parser.parse2(args)?;

    let collection = collection.ok_or_else(|| {
        syn::Error::new_spanned(&input.ident, "entity requires `collection = \"...\"`")
    })?;

    let value = collection.value();
    let valid = value.chars().next().is_some_and(|c| !c.is_ascii_digit())
        && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(syn::Error::new_spanned(
            &collection,
            "collection must be lowercase ASCII alphanumerics or `_`, not starting with a digit",
        ));
    }
    Ok(collection)
}

fn is_optional_i64(ty: &Type) -> bool {
    matches!(
        single_generic(ty, "Option"),
        Some(Type::Path(p)) if p.path.segments.last().is_some_and(|s| s.ident == "i64")
    )
}

fn is_audit_metadata(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|s| s.ident == "AuditMetadata")
}
