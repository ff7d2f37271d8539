mod common;
use common::Session;

fn eval(expr: &str) -> String {
    let mut s = Session::new();
    s.enter(&format!("PRINT {}", expr));
    let mut out = s.output();
    assert!(out.ends_with('\n'), "no output for {}", expr);
    out.pop();
    out
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval("1+2*3"), "7");
    assert_eq!(eval("(1+2)*3"), "9");
    assert_eq!(eval("10-2-3"), "5");
    assert_eq!(eval("17/5"), "3");
    assert_eq!(eval("17%5"), "2");
}

#[test]
fn test_unary_sign() {
    assert_eq!(eval("-5+8"), "3");
    assert_eq!(eval("+5"), "5");
    assert_eq!(eval("2*(-3)"), "-6");
}

#[test]
fn test_relations_return_zero_or_one() {
    assert_eq!(eval("1=1"), "1");
    assert_eq!(eval("1<>1"), "0");
    assert_eq!(eval("2>1"), "1");
    assert_eq!(eval("2<1"), "0");
    assert_eq!(eval("2>=2"), "1");
    assert_eq!(eval("2<=1"), "0");
}

#[test]
fn test_logic() {
    assert_eq!(eval("1 AND 2"), "1");
    assert_eq!(eval("1 AND 0"), "0");
    assert_eq!(eval("0 OR 3"), "1");
    assert_eq!(eval("0 OR 0"), "0");
    assert_eq!(eval("NOT 0"), "1");
    assert_eq!(eval("NOT 7"), "0");
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(eval("1 OR 0 AND 0"), "1");
    assert_eq!(eval("0 AND 0 OR 1"), "1");
}

#[test]
fn test_division_by_zero_reports() {
    let mut s = Session::new();
    s.enter("PRINT 1/0");
    assert_eq!(s.output(), "Div by 0 Error\n");
    s.enter("PRINT 1%0");
    assert_eq!(s.output(), "Div by 0 Error\n");
}

#[test]
fn test_abs_sgn() {
    assert_eq!(eval("ABS(-4)"), "4");
    assert_eq!(eval("ABS(4)"), "4");
    assert_eq!(eval("SGN(-9)"), "-1");
    assert_eq!(eval("SGN(0)"), "0");
    assert_eq!(eval("SGN(5)"), "1");
}

#[test]
fn test_sqr() {
    assert_eq!(eval("SQR(16)"), "4");
    assert_eq!(eval("SQR(0)"), "0");
}

#[test]
fn test_rnd_is_the_documented_generator() {
    // r <- 31421*r + 6927 mod 2^16, scaled by the argument
    let mut s = Session::new();
    s.enter("@R=1");
    s.enter("PRINT RND(100)");
    let expected = ((31421u32 + 6927) % 65536) * 100 / 65536;
    assert_eq!(s.output(), format!("{}\n", expected));
}

#[test]
fn test_rnd_state_is_readable() {
    let mut s = Session::new();
    s.enter("@R=7");
    s.enter("A=RND(10)");
    s.enter("PRINT @R");
    let expected = (31421u32 * 7 + 6927) % 65536;
    assert_eq!(s.output(), format!("{}\n", expected));
}

#[test]
fn test_size_reports_free_memory() {
    let mut s = Session::new();
    s.enter("PRINT SIZE");
    let empty: i64 = s.output().trim().parse().unwrap();
    s.enter("10 PRINT 1");
    s.enter("PRINT SIZE");
    let with_line: i64 = s.output().trim().parse().unwrap();
    assert!(with_line < empty);
}

#[test]
fn test_peek_poke_program_memory() {
    let mut s = Session::new();
    s.enter("POKE 100, 42");
    s.enter("PRINT PEEK(100)");
    assert_eq!(s.output(), "42\n");
}

#[test]
fn test_peek_poke_eeprom_with_negative_addresses() {
    let mut s = Session::new();
    s.enter("POKE -3, 77");
    s.enter("PRINT PEEK(-3)");
    assert_eq!(s.output(), "77\n");
}

#[test]
fn test_peek_out_of_range_reports() {
    let mut s = Session::new();
    s.enter("PRINT PEEK(-70000)");
    assert_eq!(s.output(), "Range Error\n");
}

#[test]
fn test_fre_and_himem_and_lomem() {
    let mut s = Session::new();
    s.enter("PRINT LOMEM");
    assert_eq!(s.output(), "0\n");
    s.enter("PRINT FRE(0)=SIZE");
    assert_eq!(s.output(), "1\n");
    s.enter("PRINT HIMEM>0");
    assert_eq!(s.output(), "1\n");
}

#[test]
fn test_usr_constants() {
    // number size, address size, string index size
    assert_eq!(eval("USR(0,0)"), "4");
    assert_eq!(eval("USR(0,2)"), "2");
    assert_eq!(eval("USR(0,4)"), "2");
    // stack depths
    assert_eq!(eval("USR(0,7)"), "4");
    assert_eq!(eval("USR(0,8)"), "4");
    assert_eq!(eval("USR(0,9)"), "15");
}

#[test]
fn test_usr_registers() {
    let mut s = Session::new();
    s.enter("10 PRINT 1");
    // top of an empty program vs one stored line
    s.enter("PRINT USR(1,0)>0");
    assert_eq!(s.output(), "1\n");
    s.enter("PRINT USR(1,3)");
    assert_eq!(s.output(), "0\n");
    s.enter("A0=1");
    s.enter("PRINT USR(1,3)");
    assert_eq!(s.output(), "1\n");
}

#[test]
fn test_wrong_arity_reports() {
    let mut s = Session::new();
    s.enter("PRINT ABS(1,2)");
    assert_eq!(s.output(), "Args Error\n");
    s.enter("PRINT PULSEIN(1)");
    assert_eq!(s.output(), "Args Error\n");
}

#[test]
fn test_stack_depth_limit_reports() {
    // fifteen pending left operands fill the stack, the sixteenth push
    // overflows
    let mut s = Session::new();
    let expr = format!("{}1{}", "1+(".repeat(15), ")".repeat(15));
    s.enter(&format!("PRINT {}", expr));
    assert_eq!(s.output(), "Stack Error\n");
}

#[test]
fn test_two_character_variables_live_on_the_heap() {
    let mut s = Session::new();
    s.enter("A1=11");
    s.enter("A2=22");
    s.enter("PRINT A1+A2");
    assert_eq!(s.output(), "33\n");
}

#[test]
fn test_keyword_prefix_needs_boundary() {
    let mut s = Session::new();
    s.enter("TOTAL=5");
    assert_eq!(s.output(), "Syntax Error\n");
}

#[test]
fn test_string_comparison() {
    let mut s = Session::new();
    s.enter("A$=\"HI\"");
    s.enter("PRINT A$=\"HI\"");
    assert_eq!(s.output(), "1\n");
    s.enter("PRINT A$=\"HO\"");
    assert_eq!(s.output(), "0\n");
    s.enter("PRINT A$<>\"HO\"");
    assert_eq!(s.output(), "1\n");
    s.enter("PRINT \"AB\"=\"AB\"");
    assert_eq!(s.output(), "1\n");
}

#[test]
fn test_string_in_numeric_context_is_first_char_code() {
    let mut s = Session::new();
    s.enter("A$=\"A\"");
    s.enter("PRINT A$+0");
    assert_eq!(s.output(), "65\n");
    s.enter("B$=\"\"");
    s.enter("PRINT B$+0");
    assert_eq!(s.output(), "0\n");
}

#[test]
fn test_len() {
    let mut s = Session::new();
    s.enter("A$=\"HELLO\"");
    s.enter("PRINT LEN(A$)");
    assert_eq!(s.output(), "5\n");
    s.enter("PRINT LEN(\"ABC\")");
    assert_eq!(s.output(), "3\n");
}

#[test]
fn test_millis_counts_up() {
    let mut s = Session::new();
    s.enter("PRINT MILLIS(1)>=0");
    assert_eq!(s.output(), "1\n");
}

#[test]
fn test_board_functions_read_zero() {
    assert_eq!(eval("AREAD(1)"), "0");
    assert_eq!(eval("DREAD(2)"), "0");
    assert_eq!(eval("PULSEIN(1,1,100)"), "0");
    assert_eq!(eval("AZERO"), "0");
}
