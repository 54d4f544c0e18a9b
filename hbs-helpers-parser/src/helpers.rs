// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Helper collection
//!
//! Walks a parsed template and records every distinct helper it invokes. An
//! invocation counts as a helper when it has at least one positional
//! parameter, whether it is the target of a mustache, a block or a
//! subexpression:
//!
//! ```text
//! {{greet "world"}}             greet is a helper
//! {{name}}                      plain reference
//! {{widget title=(concat a b)}} widget is hash-only, concat is a helper
//! ```

use std::collections::HashSet;

use log::{debug, trace};

use crate::{
    ast::{
        BlockStatement, BooleanLiteral, CommentStatement, ContentStatement, Expression, Hash,
        HashPair, MustacheStatement, NumberLiteral, PartialStatement, PathExpression, Program,
        StringLiteral, SubExpression,
    },
    error::Result,
    parser::parse,
    visitor::{Accept, Visitor},
};

/// Accumulates helper names during a single traversal
#[derive(Debug, Default)]
pub struct HelperCollector {
    helpers: HashSet<String>,
}

impl HelperCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, expression: &Expression) {
        if !expression.is_helper() {
            return;
        }
        if let Some(name) = expression.helper_name() {
            if self.helpers.insert(name.to_string()) {
                trace!("found helper '{name}'");
            }
        }
    }

    /// The distinct names seen so far, in no particular order
    pub fn helpers(&self) -> &HashSet<String> {
        &self.helpers
    }

    /// Drains the collected names into a sorted list
    pub fn into_sorted(self) -> Vec<String> {
        let mut helpers: Vec<String> = self.helpers.into_iter().collect();
        helpers.sort();
        helpers
    }
}

impl Visitor for HelperCollector {
    type Output = ();

    fn visit_program(&mut self, node: &Program) {
        for statement in &node.body {
            statement.accept(self);
        }
    }

    fn visit_mustache(&mut self, node: &MustacheStatement) {
        self.record(&node.expression);
        node.expression.accept(self);
    }

    fn visit_block(&mut self, node: &BlockStatement) {
        self.record(&node.expression);
        node.expression.accept(self);
        node.program.accept(self);
        if let Some(inverse) = &node.inverse {
            inverse.accept(self);
        }
    }

    fn visit_partial(&mut self, node: &PartialStatement) {
        node.name.accept(self);
        if let Some(context) = node.params.first() {
            context.accept(self);
        }
        if let Some(hash) = &node.hash {
            hash.accept(self);
        }
    }

    fn visit_content(&mut self, _node: &ContentStatement) {}

    fn visit_comment(&mut self, _node: &CommentStatement) {}

    fn visit_expression(&mut self, node: &Expression) {
        node.path.accept(self);
        for param in &node.params {
            param.accept(self);
        }
        if let Some(hash) = &node.hash {
            hash.accept(self);
        }
    }

    fn visit_sub_expression(&mut self, node: &SubExpression) {
        self.record(&node.expression);
        node.expression.accept(self);
    }

    fn visit_path(&mut self, _node: &PathExpression) {}

    fn visit_string(&mut self, _node: &StringLiteral) {}

    fn visit_number(&mut self, _node: &NumberLiteral) {}

    fn visit_boolean(&mut self, _node: &BooleanLiteral) {}

    fn visit_hash(&mut self, node: &Hash) {
        for pair in &node.pairs {
            pair.accept(self);
        }
    }

    fn visit_hash_pair(&mut self, node: &HashPair) {
        node.value.accept(self);
    }
}

/// Collects the distinct helper names used anywhere in `program`, sorted
pub fn collect_helpers(program: &Program) -> Vec<String> {
    let mut collector = HelperCollector::new();
    program.accept(&mut collector);
    let helpers = collector.into_sorted();
    debug!("collected {} helpers", helpers.len());
    helpers
}

/// Parses `src` and collects its helpers, nothing is collected when the
/// template fails to parse
pub fn helpers(src: &str) -> Result<Vec<String>> {
    Ok(collect_helpers(&parse(src)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain_reference("Hello {{name}}", &[])]
    #[case::string_param(r#"{{greet "world"}}"#, &["greet"])]
    #[case::block_with_param(r#"{{#each items}}{{format this "x"}}{{/each}}"#, &["each", "format"])]
    #[case::nested_sub_expressions(
        r#"{{set "k" (append "a" (split "b"))}}"#,
        &["append", "set", "split"]
    )]
    #[case::hash_only_excluded("{{widget title=(concat a b)}}", &["concat"])]
    #[case::block_without_params("{{#with}}{{/with}}", &[])]
    #[case::dotted_name("{{math.add 1 2}}", &["math.add"])]
    #[case::inverse_section("{{#if a}}{{else}}{{t \"none\"}}{{/if}}", &["if", "t"])]
    #[case::else_chain("{{#if a}}{{else unless b}}{{x y}}{{/if}}", &["if", "unless", "x"])]
    #[case::inverted_block("{{^items}}{{t \"empty\"}}{{/items}}", &["t"])]
    #[case::partial_context("{{> card (lookup users 0)}}", &["lookup"])]
    #[case::partial_hash("{{> card title=(upper name)}}", &["upper"])]
    #[case::dynamic_partial("{{> (whichPartial kind) }}", &["whichPartial"])]
    #[case::unescaped("{{{markdown body}}}", &["markdown"])]
    #[case::raw_block_body_ignored("{{{{raw x}}}}{{inner y}}{{{{/raw}}}}", &["raw"])]
    #[case::comment_ignored("{{! {{fake helper}} }}", &[])]
    #[case::literal_target_ignored(r#"{{"str" x}}"#, &[])]
    fn collects(#[case] src: &str, #[case] expected: &[&str]) {
        assert_eq!(helpers(src).unwrap(), expected);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let src = r#"{{t "a"}}{{t "b"}}{{#each xs}}{{t (t "c")}}{{/each}}"#;
        assert_eq!(helpers(src).unwrap(), vec!["each", "t"]);
    }

    #[test]
    fn deeply_nested_helper_is_found() {
        let src = r#"
            {{#outer a}}
                {{#inner b}}
                    {{widget opts=(wrap (deep "x") key=(deeper y))}}
                {{/inner}}
            {{/outer}}
        "#;
        assert_eq!(
            helpers(src).unwrap(),
            vec!["deep", "deeper", "inner", "outer", "wrap"]
        );
    }

    #[test]
    fn demo_template() {
        let src = r#"
<div class={{ klass }}>aaa</div>
{{assign "hello" section.settings.blog}}
{{assign "world" (append "kk" (split "array"))}}
{{#with this as |global|}}
    {{#each blogs as |blog|}}
        {{snippet "blog" title=blog.title desc=(append blog.title blog.desc)}}
    {{/each}}
{{/with}}
"#;
        assert_eq!(
            helpers(src).unwrap(),
            vec!["append", "assign", "each", "snippet", "split", "with"]
        );
    }

    #[test]
    fn mismatched_block_yields_no_helpers() {
        let err = helpers(r#"{{#a x}}{{t "y"}}{{/b}}"#).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MismatchedBlock { ref expected, ref found, .. }
                if expected == "a" && found == "b"
        ));
    }

    #[test]
    fn collector_is_reusable_only_by_value() {
        let program = parse(r#"{{a 1}}{{b 2}}"#).unwrap();
        let mut collector = HelperCollector::new();
        program.accept(&mut collector);
        assert_eq!(collector.helpers().len(), 2);
        assert_eq!(collector.into_sorted(), vec!["a", "b"]);
    }

    #[test]
    fn nesting_at_the_limit_is_collected() {
        use crate::parser::MAX_DEPTH;
        let src = format!("{{{{a {}x{}}}}}", "(b ".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(helpers(&src).unwrap(), vec!["a", "b"]);
        let src = format!("{{{{a {}x{}}}}}", "(b ".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(helpers(&src).is_err());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn core_types_are_send_and_sync() {
        assert_send_sync::<Program>();
        assert_send_sync::<ParseError>();
        assert_send_sync::<HelperCollector>();
    }

    #[test]
    fn independent_calls_run_concurrently() {
        let src = r#"{{#each xs}}{{t (fmt this "x")}}{{/each}}"#;
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| helpers(src))).collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });
        for result in results {
            assert_eq!(result.unwrap(), vec!["each", "fmt", "t"]);
        }
    }

    proptest! {
        #[test]
        fn parsing_is_idempotent(src in r#"[a-z {}#/^>!()="'.@|~\\-]{0,48}"#) {
            prop_assert_eq!(helpers(&src), helpers(&src));
        }

        #[test]
        fn generated_helpers_are_found(
            names in prop::collection::btree_set(
                "[a-z]{1,8}".prop_filter("keyword", |name| {
                    !matches!(name.as_str(), "true" | "false" | "else")
                }),
                1..6,
            ),
        ) {
            let src: String = names
                .iter()
                .map(|name| format!("{{{{#{name} x}}}}{{{{{name} (inner_{name} y)}}}}{{{{/{name}}}}}"))
                .collect();
            let mut expected: Vec<String> = names
                .iter()
                .flat_map(|name| [name.clone(), format!("inner_{name}")])
                .collect();
            expected.sort();
            prop_assert_eq!(helpers(&src).unwrap(), expected);
        }
    }
}
