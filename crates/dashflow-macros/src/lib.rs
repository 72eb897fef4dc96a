// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Procedural macros for dashflow
//!
//! This crate provides derive macros for `DashFlow` state management:
//! - `GraphState`: Derive macro for state structs with field reducers
//! - `#[tool]`: Attribute macro for creating tools from functions
//!
//! # Example - GraphState
//! ```ignore
//! use dashflow_macros::GraphState;
//! use dashflow::core::messages::Message;
//!
//! #[derive(GraphState, Clone)]
//! struct AgentState {
//!     #[add_messages]
//!     messages: Vec<Message>,
//!
//!     #[reducer(concat_strings)]
//!     log: String,
//! }
//!
//! fn concat_strings(left: String, right: String) -> String {
//!     format!("{}\n{}", left, right)
//! }
//! ```
//!
//! # Example - Tool Macro
//! ```ignore
//! use dashflow_macros::tool;
//! use serde::Deserialize;
//! use schemars::JsonSchema;
//!
//! #[derive(Debug, Deserialize, JsonSchema)]
//! struct WeatherArgs {
//!     /// City name
//!     city: String,
//! }
//!
//! /// Get current weather for a city
//! #[tool]
//! async fn get_weather(args: WeatherArgs) -> Result<String, String> {
//!     Ok(format!("Weather in {}: Sunny", args.city))
//! }
//!
//! // Use it:
//! let tool = get_weather();
//! let result = tool._call(ToolInput::Structured(json!({"city": "NYC"}))).await;
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::Parse,
    parse_macro_input,
    punctuated::Punctuated,
    Data,
    DeriveInput,
    Expr,
    ExprLit,
    ExprPath,
    Fields,
    ItemFn,
    Lit,
    Meta,
    Token,
};

/// Derive macro for graph state with field reducers
///
/// This macro generates implementations for state merging based on field attributes:
/// - `#[add_messages]`: Use the `add_messages` reducer for `Vec<Message>` fields
/// - `#[reducer(fn_name)]`: Use a custom reducer function
///
/// # Example
/// ```ignore
/// #[derive(GraphState, Clone)]
/// struct AgentState {
///     #[add_messages]
///     messages: Vec<Message>,
/// }
/// ```
// Proc-macro: unwrap() is acceptable since panics become compile errors for invalid input.
// - field.ident.as_ref().unwrap(): Named struct fields always have identifiers (validated by match)
#[allow(clippy::unwrap_used)]
#[proc_macro_derive(GraphState, attributes(add_messages, reducer))]
pub fn derive_graph_state(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // Parse struct fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    &input.ident,
                    "GraphState can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(
                &input.ident,
                "GraphState can only be derived for structs",
            )
            .to_compile_error()
            .into()
        }
    };

    // Generate merge implementations for each field
    let merge_fields = fields.iter().map(|field| {
        let field_name = field.ident.as_ref().unwrap();

        // Check for #[add_messages] attribute
        let has_add_messages = field
            .attrs
            .iter()
            .any(|attr| attr.path().get_ident().is_some_and(|i| i == "add_messages"));

        // Check for #[reducer(fn_name)] attribute
        let custom_reducer = field.attrs.iter().find_map(|attr| {
            if attr.path().get_ident().is_some_and(|i| i == "reducer") {
                if let Meta::List(meta_list) = &attr.meta {
                    // Parse the function name from the tokens
                    let tokens = &meta_list.tokens;
                    return Some(quote! { #tokens });
                }
            }
            None
        });

        if has_add_messages {
            // Use add_messages reducer via the __private module
            // This works both for internal tests and external usage
            quote! {
                #field_name: ::dashflow::__private::reducer::add_messages(
                    self.#field_name.clone(),
                    partial.#field_name.clone()
                )
            }
        } else if let Some(reducer_fn) = custom_reducer {
            // Use custom reducer function
            quote! {
                #field_name: #reducer_fn(
                    self.#field_name.clone(),
                    partial.#field_name.clone()
                )
            }
        } else {
            // Default: use value from partial (right side wins)
            quote! {
                #field_name: partial.#field_name.clone()
            }
        }
    });

    // Generate the merge_partial method
    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Merge a partial state update into this state
            ///
            /// This method is automatically generated by the `GraphState` derive macro.
            /// It applies field-specific reducers based on the attributes:
            /// - `#[add_messages]`: Merges message lists with ID-based deduplication
            /// - `#[reducer(fn)]`: Applies custom reducer function
            /// - No attribute: Uses value from partial (right side wins)
            pub fn merge_partial(&self, partial: &Self) -> Self {
                Self {
                    #(#merge_fields),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Attribute macro for creating tools from functions
///
/// This macro transforms a function into a tool factory that returns a `StructuredTool`.
/// The function's doc comment becomes the tool description, and the argument type
/// is used to generate the JSON Schema for tool parameters.
///
/// # Requirements
///
/// - The function must take exactly one argument that implements `Deserialize` and `JsonSchema`
/// - The function must return `Result<String, String>` (sync) or `impl Future<Output = Result<String, String>>` (async)
/// - The argument type must derive both `serde::Deserialize` and `schemars::JsonSchema`
///
/// # Example
///
/// ```ignore
/// use dashflow_macros::tool;
/// use serde::Deserialize;
/// use schemars::JsonSchema;
///
/// #[derive(Debug, Deserialize, JsonSchema)]
/// struct CalculatorArgs {
///     /// First number
///     a: f64,
///     /// Second number
///     b: f64,
///     /// Operation: add, subtract, multiply, divide
///     operation: String,
/// }
///
/// /// Performs basic arithmetic operations
/// #[tool]
/// fn calculator(args: CalculatorArgs) -> Result<String, String> {
///     let result = match args.operation.as_str() {
///         "add" => args.a + args.b,
///         "subtract" => args.a - args.b,
///         "multiply" => args.a * args.b,
///         "divide" => args.a / args.b,
///         _ => return Err(format!("Unknown operation: {}", args.operation)),
///     };
///     Ok(result.to_string())
/// }
///
/// // The macro generates a factory function:
/// let tool = calculator();  // Returns impl Tool
/// assert_eq!(tool.name(), "calculator");
/// ```
#[proc_macro_attribute]
pub fn tool(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(item as ItemFn);

    // Extract function components
    let fn_name = &input_fn.sig.ident;
    let fn_name_str = fn_name.to_string();
    let vis = &input_fn.vis;
    let attrs = &input_fn.attrs;
    let is_async = input_fn.sig.asyncness.is_some();
    let fn_block = &input_fn.block;

    // Extract doc comment for the description
    let description = attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(meta) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(s),
                        ..
                    }) = &meta.value
                    {
                        return Some(s.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ");

    let description = if description.is_empty() {
        format!("Tool function: {}", fn_name_str)
    } else {
        description
    };

    // Extract the argument type
    let inputs = &input_fn.sig.inputs;
    if inputs.len() != 1 {
        return syn::Error::new_spanned(
            &input_fn.sig,
            "#[tool] function must have exactly one argument (the args struct)",
        )
        .to_compile_error()
        .into();
    }

    // SAFETY: length validated to be exactly 1 above
    #[allow(clippy::indexing_slicing)] // length checked above
    let arg = &inputs[0];
    let (arg_name, arg_type) = match arg {
        syn::FnArg::Typed(pat_type) => {
            let name = &pat_type.pat;
            let ty = &pat_type.ty;
            (name, ty)
        }
        _ => {
            return syn::Error::new_spanned(arg, "#[tool] function cannot use self parameter")
                .to_compile_error()
                .into();
        }
    };

    // Generate the tool factory function
    // For async functions, we need to handle them differently
    //
    // Note: We use schemars::schema_for! macro to generate JSON Schema.
    // This is the schemars 1.x API. The generated schema is then converted
    // to serde_json::Value.
    let generated = if is_async {
        quote! {
            #(#attrs)*
            #vis fn #fn_name() -> impl ::dashflow::core::tools::Tool {
                // Inner async function that does the actual work
                async fn __inner_impl(#arg_name: #arg_type) -> ::std::result::Result<String, String>
                    #fn_block

                // Generate schema using schemars 1.x API
                let schema = ::schemars::schema_for!(#arg_type);
                let schema_value: ::serde_json::Value = ::serde_json::to_value(schema)
                    .unwrap_or_else(|_| ::serde_json::json!({"type": "object"}));

                ::dashflow::core::tools::StructuredTool::new(
                    #fn_name_str,
                    #description,
                    schema_value,
                    |#arg_name: #arg_type| __inner_impl(#arg_name)
                )
            }
        }
    } else {
        quote! {
            #(#attrs)*
            #vis fn #fn_name() -> impl ::dashflow::core::tools::Tool {
                // Inner sync function that does the actual work
                fn __inner_impl(#arg_name: #arg_type) -> ::std::result::Result<String, String>
                    #fn_block

                // Generate schema using schemars 1.x API
                let schema = ::schemars::schema_for!(#arg_type);
                let schema_value: ::serde_json::Value = ::serde_json::to_value(schema)
                    .unwrap_or_else(|_| ::serde_json::json!({"type": "object"}));

                ::dashflow::core::tools::sync_structured_tool(
                    #fn_name_str,
                    #description,
                    schema_value,
                    |#arg_name: #arg_type| -> ::std::result::Result<String, String> {
                        __inner_impl(#arg_name)
                    }
                )
            }
        }
    };

    TokenStream::from(generated)
}

#[derive(Debug)]
struct CapabilityArgs {
    tags: Vec<String>,
}

impl Parse for CapabilityArgs {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let args = Punctuated::<Expr, Token![,]>::parse_terminated(input)?;

        let mut tags = Vec::new();
        for expr in args {
            let tag = match expr {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => s.value(),
                Expr::Path(ExprPath { path, .. }) if path.segments.len() == 1 => path
                    .segments
                    .first()
                    .ok_or_else(|| {
                        syn::Error::new(
                            proc_macro2::Span::call_site(),
                            "expected a single-segment identifier",
                        )
                    })?
                    .ident
                    .to_string(),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "expected a string literal (\"tag\") or an identifier (tag)",
                    ));
                }
            };

            let tag = tag.trim().to_string();
            if tag.is_empty() {
                return Err(syn::Error::new(proc_macro2::Span::call_site(), "tag cannot be empty"));
            }
            if tag.chars().any(char::is_whitespace) {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    "tag cannot contain whitespace",
                ));
            }

            tags.push(tag);
        }

        if tags.is_empty() {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                "#[capability(...)] requires at least one tag",
            ));
        }

        Ok(Self { tags })
    }
}

/// Attribute macro for annotating platform types with capability tags.
///
/// This is a no-op macro used for static analysis and source discovery (e.g., module discovery and
/// linting), allowing types to declare what they provide.
///
/// Accepted forms:
/// - `#[dashflow::capability(\"bm25\", \"retriever\")]`
/// - `#[dashflow::capability(bm25, retriever)]`
#[proc_macro_attribute]
pub fn capability(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as CapabilityArgs);
    let _tag_count = args.tags.len();
    item
}
