//! Unit tests for the tagged-comment rewrite engine.
//!
//! The big `QUERY` fixture exercises every tag form at once: multi-line and
//! single-line tags, tags nested on one physical line, alternative names,
//! case-insensitive resolution, and array tokens inside comments.

use pretty_assertions::assert_eq;
use regex::Regex;

use sqltpl::{ExpandPolicy, ParamMap, ParamValue, Template};

const QUERY: &str = "/*param1 sql1 */
                /*param2 sql2 */
                --*param3 sql3
                --*param6 --*param7 sql7
                /*param4 --*param5 sql5 */
                /*param8 --*param9 --*param10 sql10 */
                --*param11 :@param11
                --*param12|param13 test multiple
                /*param14|param15 test multiple*/
                /*PARAM16 case-insensitive*/
                --*param17 case-insensitive2
                --*PARAM18 case-insensitive3
                /*param19 :@param19*/
                /*param20 :@param20*/
        ";

fn expand(source: &str, params: Vec<(&str, ParamValue)>) -> String {
    let map: ParamMap = params.into_iter().collect();
    Template::new(source, map).unwrap().sql().to_string()
}

fn assert_pattern(result: &str, pattern: &str) {
    let re = Regex::new(pattern).unwrap();
    assert!(
        re.is_match(result),
        "pattern {pattern:?} did not match {result:?}"
    );
}

// ============================================================================
// Conditional inclusion
// ============================================================================

#[test]
fn test_multi_line_tag_kept_when_param_present() {
    let result = expand(QUERY, vec![("param1", ParamValue::scalar("v1"))]);
    assert_eq!(result, "sql1");
}

#[test]
fn test_colon_prefixed_declaration_resolves() {
    let result = expand(QUERY, vec![(":param1", ParamValue::scalar("v1"))]);
    assert_eq!(result, "sql1");
}

#[test]
fn test_two_tags_kept() {
    let result = expand(
        QUERY,
        vec![
            ("param1", ParamValue::scalar("v1")),
            ("param2", ParamValue::typed("v2", 2)),
        ],
    );
    assert_pattern(&result, r"^sql1\s+sql2$");
}

#[test]
fn test_all_tags_dropped_without_params() {
    assert_eq!(expand(QUERY, vec![]), "");
}

#[test]
fn test_untagged_comment_survives() {
    let source = format!("-- test\n{QUERY}");
    assert_eq!(expand(&source, vec![]), "-- test");
}

#[test]
fn test_plain_text_passes_through() {
    assert_eq!(expand("sql1", vec![]), "sql1");
}

#[test]
fn test_newline_runs_collapse() {
    let result = expand(
        "sql1\n\n\n\n\nsql2",
        vec![("param1", ParamValue::scalar("v1"))],
    );
    assert_eq!(result, "sql1\nsql2");
}

// ============================================================================
// Nested single-line tags (fixpoint iteration)
// ============================================================================

#[test]
fn test_nested_tag_dropped_when_outer_param_absent_inner_present() {
    // `--*param6 --*param7 sql7`: the whole line is param6's body.
    let result = expand(QUERY, vec![("param6", ParamValue::scalar("v6"))]);
    assert_eq!(result, "");
}

#[test]
fn test_nested_tag_resolves_inner_after_outer() {
    let result = expand(
        QUERY,
        vec![
            ("param6", ParamValue::scalar("v6")),
            ("param7", ParamValue::scalar("v7")),
        ],
    );
    assert_eq!(result, "sql7");
}

#[test]
fn test_single_line_tag_inside_multi_line_body() {
    let result = expand(
        QUERY,
        vec![
            ("param4", ParamValue::scalar("v4")),
            ("param5", ParamValue::scalar("v5")),
        ],
    );
    assert_eq!(result, "sql5");
}

#[test]
fn test_doubly_nested_single_line_tags() {
    let result = expand(
        QUERY,
        vec![
            ("param8", ParamValue::scalar("v8")),
            ("param9", ParamValue::scalar("v9")),
            ("param10", ParamValue::scalar("v10")),
        ],
    );
    assert_eq!(result, "sql10");
}

#[test]
fn test_repeated_nesting_terminates() {
    let result = expand("--*p --*p --*p x", vec![("p", ParamValue::scalar("v"))]);
    assert_eq!(result, "x");
}

#[test]
fn test_conditional_rewrite_never_grows_text() {
    // With scalar-only parameters every replacement is a substring of its
    // match or empty, so expansion can only shrink the template.
    for params in [
        vec![],
        vec![("param1", ParamValue::scalar("v1"))],
        vec![
            ("param8", ParamValue::scalar("v8")),
            ("param9", ParamValue::scalar("v9")),
            ("param10", ParamValue::scalar("v10")),
        ],
    ] {
        assert!(expand(QUERY, params).len() <= QUERY.len());
    }
}

// ============================================================================
// Alternative names
// ============================================================================

#[test]
fn test_single_line_alternatives_keep_body_verbatim() {
    let result = expand(QUERY, vec![("param12", ParamValue::scalar("test"))]);
    assert_eq!(result, "test multiple");
}

#[test]
fn test_multi_line_alternatives_keep_body_verbatim() {
    let result = expand(QUERY, vec![("param14", ParamValue::scalar("test"))]);
    assert_eq!(result, "test multiple");
}

#[test]
fn test_alternatives_gate_but_do_not_substitute() {
    // The alternative expression only gates the body; the `:@a` token is left
    // alone by the comment pass and picked up later by the bare-token pass.
    let result = expand(
        "/*a|b x in (:@a)*/",
        vec![("a", ParamValue::bind_array([1i64, 2]))],
    );
    assert_eq!(result, "x in (:a_0,:a_1)");
}

// ============================================================================
// Case-insensitive resolution
// ============================================================================

#[test]
fn test_tag_upper_param_lower() {
    let result = expand(QUERY, vec![("param16", ParamValue::scalar("x"))]);
    assert_eq!(result, "case-insensitive");
}

#[test]
fn test_tag_lower_param_upper() {
    let result = expand(QUERY, vec![("PARAM17", ParamValue::scalar("x"))]);
    assert_eq!(result, "case-insensitive2");
}

#[test]
fn test_tag_upper_param_declared_lower() {
    let result = expand(QUERY, vec![("PARAM18", ParamValue::scalar("x"))]);
    assert_eq!(result, "case-insensitive3");
}

#[test]
fn test_placeholders_use_declared_casing() {
    let result = expand(QUERY, vec![("PARAM19", ParamValue::bind_array([1i64, 2]))]);
    assert_eq!(result, ":PARAM19_0,:PARAM19_1");
}

// ============================================================================
// Array expansion and bind modes
// ============================================================================

#[test]
fn test_array_token_inside_single_line_tag() {
    let result = expand(QUERY, vec![("param11", ParamValue::bind_array(["v1", "v2"]))]);
    assert_eq!(result, ":param11_0,:param11_1");
}

#[test]
fn test_nested_bind_sequence_placeholders_match_bindings() {
    use sqltpl::{BindMode, Payload, Scalar};
    let template = Template::new(
        ":@ids",
        vec![(
            "ids",
            ParamValue::Array {
                mode: BindMode::Bind,
                payload: Some(Payload::Seq(vec![
                    Payload::seq_of([1i64, 2]),
                    Payload::Leaf(Scalar::Int(3)),
                ])),
            },
        )]
        .into_iter()
        .collect(),
    )
    .unwrap();

    assert_eq!(template.sql(), ":ids_0_0,:ids_0_1,:ids_1");
    // Every bind key appears in the rewritten SQL.
    for (key, _) in template.simplified_params().iter() {
        assert!(template.sql().contains(key), "{key} missing from SQL");
    }
    assert_eq!(template.simplified_params().len(), 3);
}

#[test]
fn test_text_mode_substitutes_literal() {
    let result = expand(
        "--*param order by param",
        vec![("param", ParamValue::text("v1"))],
    );
    assert_eq!(result, "order by v1");
}

#[test]
fn test_tuple_mode_groups() {
    let result = expand(QUERY, vec![("PARAM20", ParamValue::tuple([[1i64], [2]]))]);
    assert_eq!(result, "(:PARAM20_0_0),(:PARAM20_1_0)");
}

#[test]
fn test_tuple_degenerate_scalar_payload() {
    use sqltpl::{BindMode, Payload, Scalar};
    let result = expand(
        "/*t :@t*/",
        vec![(
            "t",
            ParamValue::Array {
                mode: BindMode::Tuple,
                payload: Some(Payload::Leaf(Scalar::Int(5))),
            },
        )],
    );
    assert_eq!(result, "5");
}

#[test]
fn test_scalar_rewrites_array_token_to_single_placeholder() {
    let result = expand(
        "/*p1 WHERE id IN (:@p1)*/",
        vec![("p1", ParamValue::scalar("v"))],
    );
    assert_eq!(result, "WHERE id IN (:p1)");
}

#[test]
fn test_no_bind_keeps_body_untouched() {
    let result = expand(
        "/*flag AND active = 1*/",
        vec![("flag", ParamValue::no_bind())],
    );
    assert_eq!(result, "AND active = 1");
}

// ============================================================================
// Bare :@name tokens outside comments
// ============================================================================

#[test]
fn test_bare_token_expands_with_declared_casing() {
    let result = expand(":@paraM", vec![("paRam", ParamValue::bind_array([1i64, 2]))]);
    assert_eq!(result, ":paRam_0,:paRam_1");
}

#[test]
fn test_bare_token_after_comment_rewrite() {
    let result = expand(
        "--*param sql1\n--*parAM :@paraM",
        vec![("Param", ParamValue::bind_array([1i64, 2]))],
    );
    assert_eq!(result, "sql1\n :Param_0,:Param_1");
}

#[test]
fn test_unresolved_bare_token_kept_by_default() {
    assert_eq!(expand("WHERE x IN (:@missing)", vec![]), "WHERE x IN (:@missing)");
}

#[test]
fn test_unresolved_bare_token_dropped_on_request() {
    let template = Template::with_policy(
        "WHERE x IN (:@missing)",
        ParamMap::new(),
        ExpandPolicy {
            keep_unresolved_tokens: false,
        },
    )
    .unwrap();
    assert_eq!(template.sql(), "WHERE x IN ()");
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_display_matches_sql() {
    let template = Template::new(
        "/*p sql */",
        vec![("p", ParamValue::scalar("v"))].into_iter().collect(),
    )
    .unwrap();
    assert_eq!(template.to_string(), template.sql());
}

#[test]
fn test_template_implements_debug() {
    let template = Template::new("SELECT 1", ParamMap::new()).unwrap();
    assert!(format!("{template:?}").contains("SELECT 1"));
}

#[test]
fn test_simplified_params_cached() {
    let template = Template::new(
        ":@ids",
        vec![("ids", ParamValue::bind_array([1i64, 2]))]
            .into_iter()
            .collect(),
    )
    .unwrap();

    let first = template.simplified_params();
    let second = template.simplified_params();
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.len(), 2);
}
