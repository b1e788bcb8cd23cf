use crate::api::{StoryApi, Value};
use crate::ast::{AssignOp, BinOp, Expr, Stmt};
use crate::error::ScriptError;
use crate::parser::{parse_expression, parse_script};

/// Run a script body (a lifecycle hook or init script) for its effects.
pub fn run_script(source: &str, story: &mut dyn StoryApi) -> Result<(), ScriptError> {
    let stmts = parse_script(source)?;
    exec_block(&stmts, story)
}

/// Evaluate a when-predicate. Anything other than a boolean result is a
/// fault.
pub fn eval_predicate(source: &str, story: &mut dyn StoryApi) -> Result<bool, ScriptError> {
    let expr = parse_expression(source)?;
    match eval_expr(&expr, story)? {
        Value::Bool(b) => Ok(b),
        other => Err(ScriptError::PredicateNotBoolean(other.type_name())),
    }
}

fn exec_block(stmts: &[Stmt], story: &mut dyn StoryApi) -> Result<(), ScriptError> {
    for stmt in stmts {
        exec_stmt(stmt, story)?;
    }
    Ok(())
}

fn exec_stmt(stmt: &Stmt, story: &mut dyn StoryApi) -> Result<(), ScriptError> {
    match stmt {
        Stmt::Expr(expr) => {
            eval_expr(expr, story)?;
            Ok(())
        }
        Stmt::Assign { var, op, value } => {
            let rhs = eval_expr(value, story)?;
            let new = match op {
                AssignOp::Set => rhs,
                AssignOp::Add => arith(BinOp::Add, story.get_var(var), rhs)?,
                AssignOp::Sub => arith(BinOp::Sub, story.get_var(var), rhs)?,
            };
            story.set_var(var, new);
            Ok(())
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let branch = match eval_expr(cond, story)? {
                Value::Bool(true) => then_branch,
                Value::Bool(false) => else_branch,
                other => {
                    return Err(ScriptError::TypeMismatch(format!(
                        "if-condition must be a boolean, found {}",
                        other.type_name()
                    )));
                }
            };
            exec_block(branch, story)
        }
    }
}

fn eval_expr(expr: &Expr, story: &mut dyn StoryApi) -> Result<Value, ScriptError> {
    match expr {
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Var(name) => Ok(story.get_var(name)),
        Expr::Call { method, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, story)?);
            }
            call_method(method, &values, story)
        }
        Expr::Not(inner) => match eval_expr(inner, story)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(ScriptError::TypeMismatch(format!(
                "`!` needs a boolean, found {}",
                other.type_name()
            ))),
        },
        Expr::Neg(inner) => match eval_expr(inner, story)? {
            Value::Int(n) => Ok(Value::Int(-n)),
            other => Err(ScriptError::TypeMismatch(format!(
                "unary `-` needs an integer, found {}",
                other.type_name()
            ))),
        },
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, story),
    }
}

fn eval_binary(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    story: &mut dyn StoryApi,
) -> Result<Value, ScriptError> {
    // Short-circuit the logical operators.
    if matches!(op, BinOp::And | BinOp::Or) {
        let left = expect_bool(eval_expr(lhs, story)?, op)?;
        return match (op, left) {
            (BinOp::And, false) => Ok(Value::Bool(false)),
            (BinOp::Or, true) => Ok(Value::Bool(true)),
            _ => Ok(Value::Bool(expect_bool(eval_expr(rhs, story)?, op)?)),
        };
    }

    let left = eval_expr(lhs, story)?;
    let right = eval_expr(rhs, story)?;
    match op {
        // Equality is defined across all value types; mismatched types
        // compare unequal rather than faulting.
        BinOp::Eq => Ok(Value::Bool(left == right)),
        BinOp::Ne => Ok(Value::Bool(left != right)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let (a, b) = expect_ints(left, right, "comparison")?;
            Ok(Value::Bool(match op {
                BinOp::Lt => a < b,
                BinOp::Le => a <= b,
                BinOp::Gt => a > b,
                _ => a >= b,
            }))
        }
        BinOp::Add | BinOp::Sub => arith(op, left, right),
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

fn arith(op: BinOp, left: Value, right: Value) -> Result<Value, ScriptError> {
    match (op, left, right) {
        (BinOp::Add, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (BinOp::Sub, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        // An unset variable acts as the identity for its partner's type,
        // so hooks may say `story.n += 1` before `story.n` is first
        // assigned (lifecycle hooks can fire before the init script).
        (BinOp::Add, Value::Null, Value::Int(b)) => Ok(Value::Int(b)),
        (BinOp::Sub, Value::Null, Value::Int(b)) => Ok(Value::Int(-b)),
        (BinOp::Add | BinOp::Sub, Value::Int(a), Value::Null) => Ok(Value::Int(a)),
        (BinOp::Add, Value::Null, Value::Str(b)) => Ok(Value::Str(b)),
        (BinOp::Add, Value::Str(a), Value::Null) => Ok(Value::Str(a)),
        (_, left, right) => Err(ScriptError::TypeMismatch(format!(
            "cannot apply arithmetic to {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn expect_bool(value: Value, op: BinOp) -> Result<bool, ScriptError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ScriptError::TypeMismatch(format!(
            "{op:?} needs boolean operands, found {}",
            other.type_name()
        ))),
    }
}

fn expect_ints(left: Value, right: Value, what: &str) -> Result<(i64, i64), ScriptError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok((a, b)),
        (left, right) => Err(ScriptError::TypeMismatch(format!(
            "{what} needs integer operands, found {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Dispatch a story API call.
fn call_method(
    method: &str,
    args: &[Value],
    story: &mut dyn StoryApi,
) -> Result<Value, ScriptError> {
    match method {
        "currentPageIs" => {
            let id = one_str(method, args)?;
            Ok(Value::Bool(story.current_page_is(&id)))
        }
        "isInInventory" => {
            let id = one_str(method, args)?;
            Ok(Value::Bool(story.is_in_inventory(&id)))
        }
        "getNumTotalActions" => {
            no_args(method, args)?;
            Ok(Value::Int(story.num_total_actions()))
        }
        "getNumActionsPerformedInPage" => {
            no_args(method, args)?;
            Ok(Value::Int(story.num_actions_performed_in_page()))
        }
        "getNumPagesTurned" => {
            no_args(method, args)?;
            Ok(Value::Int(story.num_pages_turned()))
        }
        "getNumParagraphsShown" => {
            no_args(method, args)?;
            Ok(Value::Int(story.num_paragraphs_shown()))
        }
        "getNumParagraphsShownInPage" => {
            no_args(method, args)?;
            Ok(Value::Int(story.num_paragraphs_shown_in_page()))
        }
        "putInInventory" => {
            let id = one_str(method, args)?;
            story.put_in_inventory(&id);
            Ok(Value::Null)
        }
        "removeFromInventory" => {
            let id = one_str(method, args)?;
            story.remove_from_inventory(&id);
            Ok(Value::Null)
        }
        "turnTo" => {
            let id = one_str(method, args)?;
            story.turn_to(&id);
            Ok(Value::Null)
        }
        "showParagraph" => {
            let id = one_str(method, args)?;
            story.show_paragraph(&id);
            Ok(Value::Null)
        }
        "disable" => {
            let id = one_str(method, args)?;
            story.disable(&id);
            Ok(Value::Null)
        }
        "enable" => {
            let id = one_str(method, args)?;
            story.enable(&id);
            Ok(Value::Null)
        }
        "endGame" => {
            no_args(method, args)?;
            story.end_game();
            Ok(Value::Null)
        }
        other => Err(ScriptError::UnknownMethod(other.to_string())),
    }
}

fn one_str(method: &str, args: &[Value]) -> Result<String, ScriptError> {
    match args {
        [Value::Str(s)] => Ok(s.clone()),
        [other] => Err(ScriptError::TypeMismatch(format!(
            "story.{method} needs a string argument, found {}",
            other.type_name()
        ))),
        _ => Err(ScriptError::WrongArity {
            method: method.to_string(),
            expected: 1,
            found: args.len(),
        }),
    }
}

fn no_args(method: &str, args: &[Value]) -> Result<(), ScriptError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ScriptError::WrongArity {
            method: method.to_string(),
            expected: 0,
            found: args.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A hand-rolled story double recording calls and holding state.
    #[derive(Default)]
    struct FakeStory {
        current_page: String,
        inventory: Vec<String>,
        vars: HashMap<String, Value>,
        counters: [i64; 5],
        requests: Vec<String>,
    }

    impl StoryApi for FakeStory {
        fn current_page_is(&self, id: &str) -> bool {
            self.current_page == id
        }
        fn is_in_inventory(&self, id: &str) -> bool {
            self.inventory.iter().any(|item| item == id)
        }
        fn num_total_actions(&self) -> i64 {
            self.counters[0]
        }
        fn num_actions_performed_in_page(&self) -> i64 {
            self.counters[1]
        }
        fn num_pages_turned(&self) -> i64 {
            self.counters[2]
        }
        fn num_paragraphs_shown(&self) -> i64 {
            self.counters[3]
        }
        fn num_paragraphs_shown_in_page(&self) -> i64 {
            self.counters[4]
        }
        fn get_var(&self, name: &str) -> Value {
            self.vars.get(name).cloned().unwrap_or(Value::Null)
        }
        fn set_var(&mut self, name: &str, value: Value) {
            self.vars.insert(name.to_string(), value);
        }
        fn put_in_inventory(&mut self, id: &str) {
            self.inventory.retain(|item| item != id);
            self.inventory.push(id.to_string());
        }
        fn remove_from_inventory(&mut self, id: &str) {
            self.inventory.retain(|item| item != id);
        }
        fn turn_to(&mut self, id: &str) {
            self.requests.push(format!("turnTo:{id}"));
        }
        fn show_paragraph(&mut self, id: &str) {
            self.requests.push(format!("showParagraph:{id}"));
        }
        fn disable(&mut self, id: &str) {
            self.requests.push(format!("disable:{id}"));
        }
        fn enable(&mut self, id: &str) {
            self.requests.push(format!("enable:{id}"));
        }
        fn end_game(&mut self) {
            self.requests.push("endGame".to_string());
        }
    }

    #[test]
    fn predicate_inventory_gate() {
        let mut story = FakeStory::default();
        assert!(eval_predicate("!story.isInInventory('lamp')", &mut story).unwrap());

        story.put_in_inventory("lamp");
        assert!(!eval_predicate("!story.isInInventory('lamp')", &mut story).unwrap());
    }

    #[test]
    fn predicate_counter_comparison() {
        let mut story = FakeStory {
            counters: [0, 0, 3, 0, 0],
            ..Default::default()
        };
        assert!(eval_predicate("story.getNumPagesTurned() >= 3", &mut story).unwrap());
        assert!(!eval_predicate("story.getNumPagesTurned() > 3", &mut story).unwrap());
    }

    #[test]
    fn predicate_must_be_boolean() {
        let mut story = FakeStory::default();
        let err = eval_predicate("story.getNumPagesTurned()", &mut story).unwrap_err();
        assert!(matches!(err, ScriptError::PredicateNotBoolean("integer")));
    }

    #[test]
    fn script_sets_and_bumps_variables() {
        let mut story = FakeStory::default();
        run_script(
            "story.n = 40\nstory.n += 7\nstory.n -= 5",
            &mut story,
        )
        .unwrap();
        assert_eq!(story.get_var("n"), Value::Int(42));
    }

    #[test]
    fn script_if_branches_on_page() {
        let mut story = FakeStory {
            current_page: "cellar".into(),
            ..Default::default()
        };
        run_script(
            "if (story.currentPageIs('cellar')) { story.dark = true } else { story.dark = false }",
            &mut story,
        )
        .unwrap();
        assert_eq!(story.get_var("dark"), Value::Bool(true));
    }

    #[test]
    fn script_navigation_goes_through_the_api() {
        let mut story = FakeStory::default();
        run_script("story.turnTo('cellar'); story.showParagraph('smell')", &mut story).unwrap();
        assert_eq!(
            story.requests,
            vec!["turnTo:cellar".to_string(), "showParagraph:smell".to_string()]
        );
    }

    #[test]
    fn unset_variable_reads_null_and_compares_unequal() {
        let mut story = FakeStory::default();
        assert!(eval_predicate("story.ghost == 7", &mut story).is_ok_and(|b| !b));
        assert!(eval_predicate("story.ghost != 7", &mut story).unwrap());
    }

    #[test]
    fn compound_assignment_on_unset_variable_starts_from_zero() {
        let mut story = FakeStory::default();
        run_script("story.ghost += 7", &mut story).unwrap();
        assert_eq!(story.get_var("ghost"), Value::Int(7));
    }

    #[test]
    fn arithmetic_on_booleans_is_a_fault() {
        let mut story = FakeStory::default();
        let err = run_script("story.x = true + 1", &mut story).unwrap_err();
        assert!(matches!(err, ScriptError::TypeMismatch(_)));
    }

    #[test]
    fn unknown_method_is_a_fault() {
        let mut story = FakeStory::default();
        let err = run_script("story.launchMissiles('now')", &mut story).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownMethod(name) if name == "launchMissiles"));
    }

    #[test]
    fn wrong_arity_is_a_fault() {
        let mut story = FakeStory::default();
        let err = eval_predicate("story.isInInventory()", &mut story).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::WrongArity { expected: 1, found: 0, .. }
        ));
    }

    #[test]
    fn short_circuit_skips_rhs() {
        let mut story = FakeStory::default();
        // The right side would fault with wrong arity; short-circuiting
        // must prevent it from being evaluated.
        assert!(!eval_predicate("false && story.isInInventory()", &mut story).unwrap());
        assert!(eval_predicate("true || story.isInInventory()", &mut story).unwrap());
    }

    #[test]
    fn string_concatenation() {
        let mut story = FakeStory::default();
        run_script("story.name = 'Ari' + 'adne'", &mut story).unwrap();
        assert_eq!(story.get_var("name"), Value::Str("Ariadne".into()));
    }
}
