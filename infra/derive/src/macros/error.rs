use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Type, Variant, Visibility};

const CONTEXT_FIELD: &str = "context";
const SOURCE_FIELD: &str = "source";

struct VariantSpec<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    cfg_attrs: Vec<&'a Attribute>,
    doc_attrs: Vec<&'a Attribute>,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input.ident, "strata_error can only be applied to enums")
            .to_compile_error();
    };

    let mut specs = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        match inspect_variant(variant) {
            Ok(spec) => specs.push(spec),
            Err(err) => return err.to_compile_error(),
        }
    }

    let name = &input.ident;
    let vis = &input.vis;
    let kind_name = format_ident!("{}Kind", name);
    let ext_name = format_ident!("{}Ext", name);

    let derives = missing_derives(&input.attrs);
    let kind_items = expand_kind(vis, name, &kind_name, &specs);
    let ext_items = expand_context_ext(vis, name, &ext_name, &specs);
    let from_items = specs.iter().filter_map(|spec| expand_from_source(name, &ext_name, spec));
    let internal_items = expand_internal(name, &specs);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #kind_items
        #ext_items
        #(#from_items)*
        #internal_items

        #[allow(dead_code)]
        fn format_context(
            context: &Option<std::borrow::Cow<'static, str>>,
        ) -> std::borrow::Cow<'static, str> {
            match context {
                Some(c) => std::borrow::Cow::Owned(format!(" ({c})")),
                None => std::borrow::Cow::Borrowed(""),
            }
        }
    }
}

fn inspect_variant(variant: &Variant) -> syn::Result<VariantSpec<'_>> {
    let Fields::Named(fields) = &variant.fields else {
        return Err(syn::Error::new_spanned(
            variant,
            "strata_error variants must use named fields (`message`, `source`, `context`)",
        ));
    };

    let mut has_context = false;
    let mut source = None;
    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else { continue };
        if ident == CONTEXT_FIELD {
            if !is_context_type(&field.ty) {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "context field must be Option<Cow<'static, str>>",
                ));
            }
            has_context = true;
        } else if ident == SOURCE_FIELD
            || field.attrs.iter().any(|attr| attr.path().is_ident(SOURCE_FIELD))
        {
            source = Some((ident, &field.ty));
        }
    }

    if source.is_some() && !has_context {
        return Err(syn::Error::new_spanned(
            &variant.ident,
            "strata_error requires `context: Option<Cow<'static, str>>` next to a source field",
        ));
    }

    Ok(VariantSpec {
        ident: &variant.ident,
        source,
        has_context,
        cfg_attrs: variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).collect(),
        doc_attrs: variant.attrs.iter().filter(|a| a.path().is_ident("doc")).collect(),
    })
}

fn expand_kind(
    vis: &Visibility,
    name: &Ident,
    kind_name: &Ident,
    specs: &[VariantSpec<'_>],
) -> TokenStream {
    let kind_variants = specs.iter().map(|spec| {
        let ident = spec.ident;
        let cfg_attrs = &spec.cfg_attrs;
        let doc_attrs = &spec.doc_attrs;
        quote! { #(#cfg_attrs)* #(#doc_attrs)* #ident, }
    });
    let arms = specs.iter().map(|spec| {
        let ident = spec.ident;
        let cfg_attrs = &spec.cfg_attrs;
        quote! { #(#cfg_attrs)* Self::#ident { .. } => #kind_name::#ident, }
    });
    let doc = format!("Field-less discriminant of [`{name}`].");

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #kind_name {
            #(#kind_variants)*
        }

        #[automatically_derived]
        impl #name {
            /// Returns the failure category without the attached payload.
            #[must_use]
            pub const fn kind(&self) -> #kind_name {
                match self {
                    #(#arms)*
                }
            }
        }
    }
}

fn expand_context_ext(
    vis: &Visibility,
    name: &Ident,
    ext_name: &Ident,
    specs: &[VariantSpec<'_>],
) -> TokenStream {
    let arms = specs.iter().filter(|spec| spec.has_context).map(|spec| {
        let ident = spec.ident;
        let cfg_attrs = &spec.cfg_attrs;
        quote! { #(#cfg_attrs)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
    });

    quote! {
        #vis trait #ext_name<T> {
            /// Attaches a human readable context to the error, replacing any previous one.
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext_name<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut err| {
                    #[allow(unreachable_patterns)]
                    match &mut err {
                        #(#arms)*
                        _ => {},
                    }
                    err
                })
            }
        }
    }
}

fn expand_from_source(
    name: &Ident,
    ext_name: &Ident,
    spec: &VariantSpec<'_>,
) -> Option<TokenStream> {
    if spec.ident == "Internal" {
        return None;
    }
    let (field, ty) = spec.source?;
    let ident = spec.ident;
    let cfg_attrs = &spec.cfg_attrs;

    Some(quote! {
        #(#cfg_attrs)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self {
                Self::#ident { #field, context: None }
            }
        }

        #(#cfg_attrs)*
        #[automatically_derived]
        impl<T> #ext_name<T> for std::result::Result<T, #ty> {
            #[inline]
            fn context(
                self,
                context: impl Into<std::borrow::Cow<'static, str>>,
            ) -> std::result::Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    })
}

fn expand_internal(name: &Ident, specs: &[VariantSpec<'_>]) -> TokenStream {
    let Some(internal) = specs.iter().find(|spec| spec.ident == "Internal") else {
        return TokenStream::new();
    };
    let cfg_attrs = &internal.cfg_attrs;

    quote! {
        #(#cfg_attrs)*
        impl From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal { message: std::borrow::Cow::Borrowed(message), context: None }
            }
        }

        #(#cfg_attrs)*
        impl From<String> for #name {
            #[inline]
            fn from(message: String) -> Self {
                Self::Internal { message: std::borrow::Cow::Owned(message), context: None }
            }
        }
    }
}

fn missing_derives(attrs: &[Attribute]) -> TokenStream {
    let mut present = FxHashSet::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                present.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }

    let mut derives = Vec::new();
    if !present.contains("Debug") {
        derives.push(quote! { Debug });
    }
    if !present.contains("Error") {
        derives.push(quote! { ::thiserror::Error });
    }

    if derives.is_empty() { TokenStream::new() } else { quote! { #[derive(#(#derives),*)] } }
}

/// Accepts `Option<Cow<'static, str>>` with any path prefix on `Option` and `Cow`.
fn is_context_type(ty: &Type) -> bool {
    let rendered: String =
        quote!(#ty).to_string().chars().filter(|c| !c.is_whitespace()).collect();
    let Some(inner) = rendered.strip_suffix(">>") else {
        return false;
    };
    let Some((outer, cow)) = inner.split_once('<') else {
        return false;
    };
    outer.rsplit("::").next() == Some("Option")
        && cow.rsplit_once("::").map_or(cow, |(_, tail)| tail) == "Cow<'static,str"
}
