use bristle::{Engine, Format};

#[test]
fn compile_ok() {
    let engine = Engine::new();
    engine
        .compile("{{a}} {{#b}}{{^c}}{{/c}}{{/b}} {{>p}} {{$d}}{{/d}}")
        .unwrap();
}

#[test]
fn compile_format_from_str() {
    "lorem {{ipsum}}".parse::<Format>().unwrap();
}

#[test]
fn compile_err_unclosed_tag() {
    let err = Engine::new().compile("lorem {{ ipsum").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | lorem {{ ipsum
   |       ^^ unclosed tag
"
    );
}

#[test]
fn compile_err_unclosed_tag_multiline() {
    let err = Engine::new().compile("hello\n{{ world").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 2 | {{ world
   | ^^ unclosed tag
"
    );
}

#[test]
fn compile_err_unclosed_section() {
    let err = Engine::new().compile("{{#a}}b").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | {{#a}}b
   | ^^^^^^ unclosed section `a`
"
    );
}

#[test]
fn compile_err_mismatched_closing_tag() {
    let err = Engine::new().compile("{{#a}}{{/b}}").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | {{#a}}{{/b}}
   |       ^^^^^^ mismatched closing tag, expected `a`
"
    );
}

#[test]
fn compile_err_unexpected_closing_tag() {
    let err = Engine::new().compile("a{{/b}}").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | a{{/b}}
   |  ^^^^^^ unexpected closing tag
"
    );
}

#[test]
fn compile_err_empty_tag() {
    let err = Engine::new().compile("{{}}").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | {{}}
   | ^^^^ empty tag
"
    );
}

#[test]
fn compile_err_invalid_set_delimiter() {
    let err = Engine::new().compile("{{=a=}}").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | {{=a=}}
   | ^^^^^^^ invalid set-delimiter tag
"
    );
}

#[test]
fn compile_err_in_added_template() {
    let mut engine = Engine::new();
    assert!(engine.add_template("bad", "{{#a}}").is_err());
    assert!(engine.get_template("bad").is_none());
}
