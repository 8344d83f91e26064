use std::collections::HashMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Expr, ExprLit, Fields, Ident, Lit, LitInt, LitStr,
    Result, Variant,
};

/// Largest channel count a state code can be decoded from.
const MAX_CHANNELS: u8 = 16;

pub(crate) fn expand_state_table(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`StateTable` may only be derived on enums.",
        ))?
    };

    let Some(attr) = input.attrs.iter().find(|a| a.path().is_ident("state")) else {
        Err(Error::new_spanned(
            &input.ident,
            "`StateTable` requires a `state(channels = N, row = \"..\")` attribute.",
        ))?
    };

    let TableMetadata {
        channels,
        row,
        description,
    } = TableMetadata::parse(attr)?;

    let states = data
        .variants
        .iter()
        .map(StateMetadata::parse)
        .collect::<Result<Vec<_>>>()?;

    let mut codes: HashMap<u16, &Ident> = HashMap::new();

    for state in &states {
        if u32::from(state.code) >= 1 << channels {
            Err(Error::new_spanned(
                &state.code_lit,
                format!("State codes decoded from {channels} channels must be below {}.", 1u32 << channels),
            ))?
        }

        if let Some(existing) = codes.insert(state.code, &state.name) {
            Err(Error::new_spanned(
                &state.code_lit,
                format!("State codes must be unique; `{existing}` has the same code."),
            ))?
        }
    }

    let names = states.iter().map(|s| &s.name).collect::<Vec<_>>();
    let values = states.iter().map(|s| &s.code_lit).collect::<Vec<_>>();
    let texts = states.iter().map(|s| {
        let StateMetadata {
            long,
            short,
            abbr,
            numeric,
            ..
        } = s;

        quote! { [#long, #short, #abbr, #numeric] }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl ::fsmtap::table::StateLabel for #name {
            const CHANNELS: u8 = #channels;
            const ROW: ::fsmtap::table::Row = ::fsmtap::table::Row {
                id: #row,
                description: #description,
            };
            const STATES: &'static [Self] = &[#(Self::#names),*];

            fn from_code(
                code: ::fsmtap::sans::lines::StateCode,
            ) -> ::core::option::Option<Self> {
                match code.get() {
                    #(#values => ::core::option::Option::Some(Self::#names),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn code(self) -> ::fsmtap::sans::lines::StateCode {
                match self {
                    #(Self::#names => ::fsmtap::sans::lines::StateCode::new(#values),)*
                }
            }

            fn annotation(self) -> ::fsmtap::table::Annotation {
                match self {
                    #(Self::#names => ::fsmtap::table::Annotation {
                        class: #values,
                        texts: #texts,
                    },)*
                }
            }
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct TableMetadata {
    channels: u8,
    row: LitStr,
    description: LitStr,
}

impl TableMetadata {
    fn parse(attr: &Attribute) -> Result<Self> {
        let mut channels = None;
        let mut row = None;
        let mut description = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("channels") {
                let lit = meta.value()?.parse::<LitInt>()?;
                let value = lit.base10_parse::<u8>()?;

                if !(1..=MAX_CHANNELS).contains(&value) {
                    Err(Error::new_spanned(
                        &lit,
                        format!("Channel count must be between 1 and {MAX_CHANNELS}."),
                    ))?
                }

                channels = Some(value);
            } else if meta.path.is_ident("row") {
                row = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.path.is_ident("description") {
                description = Some(meta.value()?.parse::<LitStr>()?);
            } else {
                Err(meta.error("Expected `channels`, `row`, or `description`."))?
            }

            Ok(())
        })?;

        let Some(channels) = channels else {
            Err(Error::new_spanned(attr, "Missing `channels` count."))?
        };

        let Some(row) = row else {
            Err(Error::new_spanned(attr, "Missing annotation `row` identifier."))?
        };

        // The row identifier doubles as its description when none is given.
        let description = description.unwrap_or_else(|| row.clone());

        Ok(Self {
            channels,
            row,
            description,
        })
    }
}

#[derive(Debug)]
struct StateMetadata {
    name: Ident,
    code: u16,
    code_lit: LitInt,
    long: LitStr,
    short: LitStr,
    abbr: LitStr,
    numeric: LitStr,
}

impl StateMetadata {
    fn parse(variant: &Variant) -> Result<Self> {
        let name = variant.ident.clone();

        let Fields::Unit = variant.fields else {
            Err(Error::new_spanned(
                &variant.fields,
                "State variants must not hold fields.",
            ))?
        };

        let Some((
            _,
            Expr::Lit(ExprLit {
                lit: Lit::Int(lit), ..
            }),
        )) = &variant.discriminant
        else {
            Err(Error::new_spanned(
                variant,
                "State variants must have an integer literal discriminant.",
            ))?
        };

        let code = lit.base10_parse::<u16>()?;
        let code_lit = LitInt::new(&code.to_string(), lit.span());

        let mut long = None;
        let mut short = None;
        let mut abbr = None;

        if let Some(attr) = variant.attrs.iter().find(|a| a.path().is_ident("state")) {
            attr.parse_nested_meta(|meta| {
                let slot = if meta.path.is_ident("long") {
                    &mut long
                } else if meta.path.is_ident("short") {
                    &mut short
                } else if meta.path.is_ident("abbr") {
                    &mut abbr
                } else {
                    Err(meta.error("Expected `long`, `short`, or `abbr`."))?
                };

                *slot = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            })?;
        }

        let Some(abbr) = abbr else {
            Err(Error::new_spanned(
                &variant.ident,
                "State variants require an `abbr` text.",
            ))?
        };

        let short = short.unwrap_or_else(|| LitStr::new(&name.to_string(), name.span()));
        let long = long
            .unwrap_or_else(|| LitStr::new(&format!("{} = {code}", short.value()), name.span()));
        let numeric = LitStr::new(&code.to_string(), lit.span());

        Ok(Self {
            name,
            code,
            code_lit,
            long,
            short,
            abbr,
            numeric,
        })
    }
}
