use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Builds the `RuntimeBuilder` expression for the given attribute arguments.
///
/// Recognised arguments are `tick_budget = N` and `stall_detection = bool`,
/// separated by commas. Unknown arguments produce a compile error.
fn runtime_builder(attr: TokenStream) -> Result<String, String> {
    let mut builder = String::from("::turnstile::RuntimeBuilder::new()");
    let attr_str = attr.to_string();

    for part in attr_str.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let Some((key, value)) = part.split_once('=') else {
            return Err(format!("expected `key = value`, found `{part}`"));
        };

        let value = value.trim();

        match key.trim() {
            "tick_budget" => {
                let n = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid tick_budget `{value}`"))?;
                builder.push_str(&format!(".tick_budget({n})"));
            }
            "stall_detection" => {
                let enabled = value
                    .parse::<bool>()
                    .map_err(|_| format!("invalid stall_detection `{value}`"))?;
                builder.push_str(&format!(".stall_detection({enabled})"));
            }
            other => return Err(format!("unknown runtime option `{other}`")),
        }
    }

    builder.push_str(".build()");
    Ok(builder)
}

/// Turns `async fn name(..) { body }` into a synchronous function whose body
/// builds a runtime and blocks on `body`.
fn wrap_in_runtime(attr: TokenStream, item: TokenStream) -> TokenStream {
    let builder = match runtime_builder(attr) {
        Ok(builder) => builder,
        Err(msg) => return compile_error(&msg),
    };

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    else {
        return compile_error("the `async` keyword is missing from the function declaration");
    };
    tokens.remove(async_pos);

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return compile_error("expected a function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_block = format!(
        "{{
            let runtime = {builder};
            runtime.block_on(async move {{ {block} }})
        }}"
    );

    match new_block.parse() {
        Ok(stream) => {
            tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
            tokens.into_iter().collect()
        }
        Err(err) => compile_error(&format!("runtime macro error: {err}")),
    }
}

fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}

/// Marks an `async fn main` to be run on a Turnstile runtime.
///
/// ```rust,ignore
/// #[turnstile::main(tick_budget = 32)]
/// async fn main() {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    wrap_in_runtime(attr, item)
}

/// Marks an `async fn` as a test run on a fresh Turnstile runtime.
///
/// Accepts the same options as [`main`](macro@main).
///
/// ```rust,ignore
/// #[turnstile::test]
/// async fn acquires() {
///     let mutex = Mutex::new();
///     mutex.acquire().await;
///     assert!(mutex.is_held());
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let body = wrap_in_runtime(attr, item);

    let mut result: TokenStream = "#[::core::prelude::v1::test]".parse().unwrap_or_default();
    result.extend(body);
    result
}
