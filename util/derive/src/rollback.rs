// Copyright 2018 Kodebox, Inc.
// This file is part of CodeChain.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Index, Member};

#[derive(Clone, Copy, PartialEq)]
enum Role {
    Anchor,
    Skip,
    Base,
    Own,
}

pub fn derive_rollbackable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match rollbackable_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

pub fn derive_tracked(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match tracked_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn rollbackable_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let fields = classify(input, "Rollbackable")?;

    let mut anchor = None;
    for (member, role, field) in &fields {
        if *role == Role::Anchor {
            if anchor.is_some() {
                return Err(syn::Error::new_spanned(field, "only one field may be annotated with `#[rollback(anchor)]`"))
            }
            anchor = Some(member.clone());
        }
    }
    let anchor = anchor.ok_or_else(|| {
        syn::Error::new_spanned(input, "missing `#[rollback(anchor)]` annotation on exactly one field")
    })?;

    let tracked = tracked_members(&fields);
    let count = tracked.len();
    let field_list = quote! {
        let fields: [&dyn ::backtrack_engine::Tracked; #count] = [#(&self.#tracked),*];
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::backtrack_engine::Rollbackable for #name #ty_generics #where_clause {
            fn checkpoint_group(&self) -> ::backtrack_engine::CheckpointGroup {
                self.#anchor.group()
            }

            fn set_checkpoint_group(&self, group: &::backtrack_engine::CheckpointGroup) {
                #field_list
                self.#anchor.join(group, &fields);
            }

            fn restore(&self, timestamp: ::backtrack_engine::Timestamp, trim: bool) {
                #field_list
                self.#anchor.restore(timestamp, trim, &fields);
            }

            fn commit(&self, timestamp: ::backtrack_engine::Timestamp) {
                #field_list
                self.#anchor.commit(timestamp, &fields);
            }
        }
    })
}

fn tracked_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let fields = classify(input, "Tracked")?;
    if let Some((_, _, field)) = fields.iter().find(|(_, role, _)| *role == Role::Anchor) {
        return Err(syn::Error::new_spanned(
            field,
            "`#[rollback(anchor)]` belongs on a `Rollbackable` type; an embedded field set has no anchor",
        ))
    }

    let tracked = tracked_members(&fields);
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::backtrack_engine::Tracked for #name #ty_generics #where_clause {
            fn restore(&self, timestamp: ::backtrack_engine::Timestamp, trim: bool) {
                #(::backtrack_engine::Tracked::restore(&self.#tracked, timestamp, trim);)*
            }

            fn commit(&self, horizon: ::backtrack_engine::Timestamp) {
                #(::backtrack_engine::Tracked::commit(&self.#tracked, horizon);)*
            }

            fn push_epoch(&self, since: ::backtrack_engine::Timestamp) {
                #(::backtrack_engine::Tracked::push_epoch(&self.#tracked, since);)*
            }

            fn pop_epoch(&self) {
                #(::backtrack_engine::Tracked::pop_epoch(&self.#tracked);)*
            }
        }
    })
}

/// Own fields in declaration order, then embedded field sets.
fn tracked_members(fields: &[(Member, Role, &Field)]) -> Vec<Member> {
    let own = fields.iter().filter(|(_, role, _)| *role == Role::Own);
    let base = fields.iter().filter(|(_, role, _)| *role == Role::Base);
    own.chain(base).map(|(member, _, _)| member.clone()).collect()
}

fn classify<'a>(input: &'a DeriveInput, derived: &str) -> syn::Result<Vec<(Member, Role, &'a Field)>> {
    let data = match &input.data {
        Data::Struct(data) => data,
        Data::Enum(_) | Data::Union(_) => {
            return Err(syn::Error::new_spanned(input, format!("{} can only be derived for structs", derived)))
        }
    };
    let fields: Vec<&Field> = match &data.fields {
        Fields::Named(fields) => fields.named.iter().collect(),
        Fields::Unnamed(fields) => fields.unnamed.iter().collect(),
        Fields::Unit => Vec::new(),
    };

    let mut classified = Vec::with_capacity(fields.len());
    for (i, field) in fields.into_iter().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(i)),
        };
        classified.push((member, role_of(field)?, field));
    }
    Ok(classified)
}

fn role_of(field: &Field) -> syn::Result<Role> {
    let mut role = Role::Own;
    for attr in &field.attrs {
        if !attr.path().is_ident("rollback") {
            continue
        }
        attr.parse_nested_meta(|meta| {
            let found = if meta.path.is_ident("anchor") {
                Role::Anchor
            } else if meta.path.is_ident("skip") {
                Role::Skip
            } else if meta.path.is_ident("base") {
                Role::Base
            } else {
                return Err(meta.error("unknown rollback attribute; expected `anchor`, `skip` or `base`"))
            };
            if role != Role::Own && role != found {
                return Err(meta.error("conflicting rollback attributes"))
            }
            role = found;
            Ok(())
        })?;
    }
    Ok(role)
}
