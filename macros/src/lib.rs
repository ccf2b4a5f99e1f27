//! Derive macros for mapping PostgreSQL rows onto structures.

use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;
use syn::DeriveInput;
use syn::LitStr;

/// Returns the column name for the given field.
///
/// The name defaults to the field's identifier and can be overridden with
/// `#[from_row(rename = "column")]`.
fn column_name(field: &syn::Field) -> syn::Result<String> {
	let mut name = None;
	for attr in field.attrs.iter().filter(|a| a.path().is_ident("from_row")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("rename") {
				let lit: LitStr = meta.value()?.parse()?;
				name = Some(lit.value());
				Ok(())
			} else {
				Err(meta.error("unsupported from_row attribute"))
			}
		})?;
	}
	// Fields always have an identifier here since only named fields are accepted
	Ok(name.unwrap_or_else(|| field.ident.as_ref().map(ToString::to_string).unwrap_or_default()))
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
	let ident = input.ident;
	let syn::Data::Struct(s) = input.data else {
		return Err(syn::Error::new_spanned(
			ident,
			"FromRow only applies to structures",
		));
	};
	let syn::Fields::Named(fields) = s.fields else {
		return Err(syn::Error::new_spanned(
			ident,
			"FromRow requires named fields",
		));
	};

	let fields = fields
		.named
		.iter()
		.map(|field| {
			let ident = &field.ident;
			let column = column_name(field)?;
			Ok(quote! {
				#ident: row.get(#column)
			})
		})
		.collect::<syn::Result<Vec<_>>>()?;

	Ok(quote! {
		impl crate::util::FromRow for #ident {
			fn from_row(row: &tokio_postgres::Row) -> Self {
				Self {
					#(#fields),*
				}
			}
		}
	})
}

/// Implements `crate::util::FromRow` by reading each field from the column of the same name.
#[proc_macro_derive(FromRow, attributes(from_row))]
pub fn from_row(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	expand(input)
		.unwrap_or_else(syn::Error::into_compile_error)
		.into()
}
