use proptest::prelude::*;

use luatab::{extract_tables, Key, Table, Value};

#[derive(Clone, Debug)]
enum Literal {
    String(String),
    Number(i32),
}

impl Literal {
    fn source(&self) -> String {
        match self {
            Literal::String(s) => format!("{:?}", s),
            Literal::Number(n) => n.to_string(),
        }
    }

    fn value(&self) -> Value {
        match self {
            Literal::String(s) => Value::from(s.as_str()),
            Literal::Number(n) => Value::Number(f64::from(*n)),
        }
    }
}

fn literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        "[a-zA-Z0-9 ,.;={}]{0,12}".prop_map(Literal::String),
        any::<i32>().prop_map(Literal::Number),
    ]
}

fn fields() -> impl Strategy<Value = Vec<(String, Literal)>> {
    proptest::collection::vec(("[A-Za-z_][A-Za-z0-9_]{0,8}", literal()), 0..8)
}

/// Text made mostly of the characters which matter to the parser.
fn lua_soup() -> impl Strategy<Value = String> {
    "[a-z\\[\\]{}()=,;\"'0-9 \n.\\-]{0,200}"
}

proptest! {
    #[test]
    fn extraction_is_idempotent(text in lua_soup()) {
        prop_assert_eq!(extract_tables(&text), extract_tables(&text));
    }

    #[test]
    fn arbitrary_text_is_accepted(text in any::<String>()) {
        extract_tables(&text);
    }

    #[test]
    fn literals_round_trip(fields in fields()) {
        let body: Vec<String> = fields
            .iter()
            .map(|(name, literal)| format!("{} = {}", name, literal.source()))
            .collect();
        let text = format!("items[\"K\"] = {{ {} }}", body.join(", "));

        let mut expected = Table::new();
        for (name, literal) in &fields {
            expected.insert(Key::from(name.as_str()), literal.value());
        }

        let tables = extract_tables(&text);
        prop_assert_eq!(tables.get_str("K"), Some(&Value::Table(expected)));
    }

    #[test]
    fn distinct_keys_are_order_independent(a in fields(), b in fields()) {
        let render = |key: &str, fields: &[(String, Literal)]| {
            let body: Vec<String> = fields
                .iter()
                .map(|(name, literal)| format!("{} = {}", name, literal.source()))
                .collect();
            format!("t[\"{}\"] = {{ {} }}\n", key, body.join("; "))
        };
        let first = render("A", a.as_slice());
        let second = render("B", b.as_slice());
        prop_assert_eq!(
            extract_tables(&format!("{}{}", first, second)),
            extract_tables(&format!("{}{}", second, first))
        );
    }
}
