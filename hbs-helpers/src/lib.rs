pub use hbs_helpers_macros::helpers_directory as directory;
pub use hbs_helpers_macros::helpers_file as file;
pub use hbs_helpers_macros::helpers_str as str;

pub use hbs_helpers_parser::{
    Accept, ErrorKind, HelperCollector, Lexer, ParseError, Parser, Position, Printer, Token,
    TokenKind, Visitor, ast, collect_helpers, helpers, parse, print_ast, tokenize,
};

#[cfg(test)]
mod tests {

    #[test]
    fn basic_usage() {
        const HELPERS: &[&str] = crate::str!(r#"<p>{{firstname}} {{lastname}}</p>"#);
        assert!(HELPERS.is_empty());
    }

    #[test]
    fn helper_with_params() {
        let found = crate::str!(
            //language=handlebars
            r#"<p>{{greet "world"}} {{upper person.name}}</p>"#
        );
        assert_eq!(found, &["greet", "upper"]);
    }

    #[test]
    fn block_and_sub_expressions() {
        let found = crate::str!(
            //language=handlebars
            r#"{{#each items}}{{set "k" (append "a" (split "b"))}}{{/each}}"#
        );
        assert_eq!(found, &["append", "each", "set", "split"]);
    }

    #[test]
    fn hash_only_is_not_a_helper() {
        let found = crate::str!(
            //language=handlebars
            r#"{{widget title=(concat a b)}}"#
        );
        assert_eq!(found, &["concat"]);
    }

    #[test]
    fn matches_run_time_collection() {
        //language=handlebars
        let src = r#"{{#if author}}<h1>{{format author.name "short"}}</h1>{{/if}}"#;
        let compile_time = crate::str!(
            r#"{{#if author}}<h1>{{format author.name "short"}}</h1>{{/if}}"#
        );
        assert_eq!(crate::helpers(src).unwrap(), compile_time);
    }

    #[test]
    fn run_time_errors() {
        let err = crate::helpers("{{#a x}}{{/b}}").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Syntax);
    }
}
