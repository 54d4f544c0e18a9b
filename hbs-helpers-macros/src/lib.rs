use hbs_helpers_parser::helpers;
use proc_macro::TokenStream;
use quote::quote;
use std::fs;
use std::path::{Path, PathBuf};
use syn::{LitStr, parse_macro_input};
use walkdir::WalkDir;

fn manifest_path(lit: &LitStr) -> syn::Result<PathBuf> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map_err(|_| syn::Error::new(lit.span(), "CARGO_MANIFEST_DIR not set"))?;
    Ok(Path::new(&manifest_dir).join(lit.value()))
}

fn helpers_for_content(
    lit: &LitStr,
    content: &str,
    origin: Option<&str>,
) -> syn::Result<Vec<String>> {
    helpers(content).map_err(|err| {
        let message = match origin {
            Some(origin) => format!("{origin}: {err}"),
            None => err.to_string(),
        };
        syn::Error::new(lit.span(), message)
    })
}

fn helpers_for_file(lit: &LitStr, path: &Path) -> syn::Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|err| {
        syn::Error::new(lit.span(), format!("Failed to read {path:?}: {err}"))
    })?;
    helpers_for_content(lit, &content, Some(&path.to_string_lossy()))
}

fn include_stmt(path: &Path) -> proc_macro2::TokenStream {
    let path_str = path.to_string_lossy();
    quote! {
        // ensure the compiler is aware the output is linked to the source so that any changes
        // to the hbs file will trigger a recompilation
        const _: &[u8] = include_bytes!(#path_str);
    }
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn expand_directory(dir_lit: &LitStr) -> syn::Result<proc_macro2::TokenStream> {
    let root_path = manifest_path(dir_lit)?;
    if !root_path.is_dir() {
        return Err(syn::Error::new(
            dir_lit.span(),
            format!("Directory not found: {:?}", root_path),
        ));
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(&root_path) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "hbs") {
            let found = helpers_for_file(dir_lit, path)?;
            templates.push((relative_name(&root_path, path), path.to_path_buf(), found));
        }
    }
    templates.sort_by(|a, b| a.0.cmp(&b.0));

    let includes = templates.iter().map(|(_, path, _)| include_stmt(path));
    let entries = templates.iter().map(|(name, _, found)| {
        quote! { (#name, &[#(#found),*]) }
    });

    Ok(quote! {
        {
            #(#includes)*
            const TEMPLATES: &[(&str, &[&str])] = &[#(#entries),*];
            TEMPLATES
        }
    })
}

fn expand_file(file_lit: &LitStr) -> syn::Result<proc_macro2::TokenStream> {
    let path = manifest_path(file_lit)?;
    if !path.is_file() {
        return Err(syn::Error::new(
            file_lit.span(),
            format!("File not found: {:?}", path),
        ));
    }

    let found = helpers_for_file(file_lit, &path)?;
    let include = include_stmt(&path);
    Ok(quote! {
        {
            #include
            const HELPERS: &[&str] = &[#(#found),*];
            HELPERS
        }
    })
}

fn expand_str(content: &LitStr) -> syn::Result<proc_macro2::TokenStream> {
    let found = helpers_for_content(content, &content.value(), None)?;
    Ok(quote! {
        {
            const HELPERS: &[&str] = &[#(#found),*];
            HELPERS
        }
    })
}

/// Lists the helpers of every `.hbs` file under a directory, keyed by the
/// path relative to that directory
#[proc_macro]
pub fn helpers_directory(input: TokenStream) -> TokenStream {
    let dir_lit = parse_macro_input!(input as LitStr);
    expand_directory(&dir_lit)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Lists the helpers of a template file relative to `CARGO_MANIFEST_DIR`
#[proc_macro]
pub fn helpers_file(input: TokenStream) -> TokenStream {
    let file_lit = parse_macro_input!(input as LitStr);
    expand_file(&file_lit)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Lists the helpers of an inline template
#[proc_macro]
pub fn helpers_str(input: TokenStream) -> TokenStream {
    let content = parse_macro_input!(input as LitStr);
    expand_str(&content)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
