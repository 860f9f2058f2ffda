//! Built-in challenges that keep the app useful without a catalogue file.

use serde_json::json;

use crate::domain::{Answer, AnswerStep, Challenge, ExampleTable, JsonRow};

const EMPLOYEES_SCHEMA: &str = "
CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, department TEXT, salary INTEGER);
INSERT INTO employees (name, department, salary) VALUES
  ('Alice', 'Engineering', 85000),
  ('Bob', 'Sales', 52000),
  ('Chen', 'Engineering', 91000),
  ('Dana', 'Sales', 61000);
";

fn row(v: serde_json::Value) -> JsonRow {
  v.as_object().cloned().unwrap_or_default()
}

pub fn seed_challenges() -> Vec<Challenge> {
  vec![
    Challenge {
      title: "Engineers only".into(),
      level: Some("Beginner".into()),
      description: "List the names of everyone in the Engineering department, in id order.".into(),
      schema: EMPLOYEES_SCHEMA.into(),
      expected_result: json!([{"name": "Alice"}, {"name": "Chen"}]),
      answer: Some(Answer {
        explanation: "Filter rows with WHERE and keep only the name column.".into(),
        steps: vec![
          AnswerStep {
            sql: "SELECT name FROM employees".into(),
            description: "Start from every name.".into(),
            is_final: false,
          },
          AnswerStep {
            sql: "SELECT name FROM employees WHERE department = 'Engineering' -- id order is the default".into(),
            description: "Keep the Engineering rows.".into(),
            is_final: true,
          },
        ],
        example_table: Some(ExampleTable {
          before: vec![
            row(json!({"name": "Alice", "department": "Engineering"})),
            row(json!({"name": "Bob", "department": "Sales"})),
          ],
          after: vec![row(json!({"name": "Alice"}))],
        }),
      }),
    },
    Challenge {
      title: "Payroll by department".into(),
      level: Some("Intermediate".into()),
      description: "Show each department with its total salary, largest total first.".into(),
      schema: EMPLOYEES_SCHEMA.into(),
      expected_result: json!([
        {"department": "Engineering", "total": 176000},
        {"department": "Sales", "total": 113000}
      ]),
      answer: Some(Answer {
        explanation: "Group rows per department, add the salaries, then sort by the sum.".into(),
        steps: vec![AnswerStep {
          sql: "SELECT department, SUM(salary) AS total FROM employees GROUP BY department ORDER BY total DESC".into(),
          description: "SUM works per group.".into(),
          is_final: true,
        }],
        example_table: None,
      }),
    },
  ]
}
