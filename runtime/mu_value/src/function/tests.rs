use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;

fn count_args(args: &Table, _scope: Option<&Table>) -> Result<Value, Error> {
    Ok(Value::index(args.len()))
}

fn read_scope(_args: &Table, scope: Option<&Table>) -> Result<Value, Error> {
    Ok(scope.map_or(Value::Nil, |s| s.lookup(&Value::from("x"))))
}

struct Doubler;

impl Callable for Doubler {
    fn call(&self, args: &Table, _scope: Option<&Table>) -> Result<Value, Error> {
        let n = args.lookup(&Value::index(0)).as_number().unwrap_or(0.0);
        Ok(Value::Number(2.0 * n))
    }
}

fn args(values: &[f64]) -> Table {
    let t = Table::new(values.len());
    for &n in values {
        assert_eq!(t.add(Value::Number(n)), Ok(()));
    }
    t
}

#[test]
fn builtin_receives_args() {
    let b = Builtin::new(count_args, None);
    assert_eq!(b.call(&args(&[1.0, 2.0, 3.0])), Ok(Value::index(3)));
}

#[test]
fn builtin_receives_scope() {
    let scope = Table::new(0);
    assert_eq!(scope.insert(Value::from("x"), Value::Number(7.0)), Ok(()));
    let b = Builtin::new(read_scope, Some(scope));
    assert_eq!(b.call(&args(&[])), Ok(Value::Number(7.0)));
    assert_eq!(Builtin::new(read_scope, None).call(&args(&[])), Ok(Value::Nil));
}

#[test]
fn builtin_identity() {
    let a = Builtin::new(count_args, None);
    assert!(a.same(&a.clone()));
    assert!(!a.same(&Builtin::new(read_scope, None)));
    assert!(!a.same(&Builtin::new(count_args, Some(Table::new(0)))));
    assert_eq!(a.hash(), a.clone().hash());
}

#[test]
fn closure_calls_code() {
    let c = Closure::new(Rc::new(Doubler), None);
    assert_eq!(c.call(&args(&[21.0])), Ok(Value::Number(42.0)));
}

#[test]
fn closure_identity_is_the_code_object() {
    let code: Rc<dyn Callable> = Rc::new(Doubler);
    let a = Closure::new(Rc::clone(&code), None);
    let b = Closure::new(code, None);
    let other = Closure::new(Rc::new(Doubler), None);
    assert!(a.same(&b));
    assert!(!a.same(&other));
}

#[test]
fn reprs_name_the_kind() {
    let b = Builtin::new(count_args, None).repr().map(|s| s.to_string());
    assert!(b.is_ok_and(|s| s.starts_with("bfn 0x")));
    let c = Closure::new(Rc::new(Doubler), None).repr().map(|s| s.to_string());
    assert!(c.is_ok_and(|s| s.starts_with("fn 0x")));
}
