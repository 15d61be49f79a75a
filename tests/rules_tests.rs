// Tests for the "if TRIGGER then ACTION" heuristic used before the NLU
// fallback. Only the parse is local; rule storage lives in the collaborator.

use aura_voice::collab::parse_rule;

#[test]
fn test_parse_simple_rule() {
    let (trigger, action) =
        parse_rule("if salary arrives then move 10% to savings").expect("should parse");

    assert_eq!(trigger, "salary arrives");
    assert_eq!(action, "move 10% to savings");
}

#[test]
fn test_parse_is_case_insensitive() {
    let (trigger, action) = parse_rule("If rent is due Then notify me").expect("should parse");

    assert_eq!(trigger, "rent is due");
    assert_eq!(action, "notify me");
}

#[test]
fn test_parse_trims_whitespace() {
    let (trigger, action) =
        parse_rule("if  balance drops below 100  then  alert me ").expect("should parse");

    assert_eq!(trigger, "balance drops below 100");
    assert_eq!(action, "alert me");
}

#[test]
fn test_parse_takes_first_then() {
    // Lazy trigger match: the first "then" splits the rule
    let (trigger, action) =
        parse_rule("if A then B then C").expect("should parse");

    assert_eq!(trigger, "A");
    assert_eq!(action, "B then C");
}

#[test]
fn test_parse_is_stable_across_repeated_calls() {
    // The pattern compiles once and is shared; every call sees the same
    // behavior, including from concurrent callers.
    for _ in 0..100 {
        assert!(parse_rule("if x then y").is_some());
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                parse_rule("if payday then sweep the surplus")
                    .expect("should parse")
            })
        })
        .collect();
    for handle in handles {
        let (trigger, action) = handle.join().expect("thread completed");
        assert_eq!(trigger, "payday");
        assert_eq!(action, "sweep the surplus");
    }
}

#[test]
fn test_free_text_does_not_parse() {
    assert!(parse_rule("what is my balance").is_none());
    assert!(parse_rule("if only I had more money").is_none());
    assert!(parse_rule("").is_none());
}
