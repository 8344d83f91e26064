use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod state_table;

#[proc_macro_derive(StateTable, attributes(state))]
pub fn derive_state_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match state_table::expand_state_table(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}
