mod common;
use common::Session;

#[test]
fn test_save_and_load_the_image() {
    let mut s = Session::new();
    s.enter("10 PRINT \"ROM\"");
    s.enter("SAVE \"!\"");
    s.enter("NEW");
    s.enter("LIST");
    assert_eq!(s.output(), "");
    s.enter("LOAD \"!\"");
    s.enter("RUN");
    assert_eq!(s.output(), "ROM\n");
}

#[test]
fn test_flag_byte_after_save() {
    let mut s = Session::new();
    // erased image reads 255, a stored one 0
    s.enter("PRINT PEEK(-1)");
    assert_eq!(s.output(), "-1\n");
    s.enter("10 PRINT 1");
    s.enter("SAVE \"!\"");
    s.enter("PRINT PEEK(-1)");
    assert_eq!(s.output(), "0\n");
}

#[test]
fn test_load_from_erased_image_reports() {
    let mut s = Session::new();
    s.enter("LOAD \"!\"");
    assert_eq!(s.output(), "EEPROM Error\n");
}

#[test]
fn test_autorun_boots_from_the_image() {
    let mut s = Session::new();
    s.enter("10 PRINT \"BOOT\"");
    s.enter("SAVE \"!\"");
    s.enter("SET 1, 1");
    s.enter("NEW");
    s.output();
    s.runtime.boot();
    assert_eq!(s.output(), "BOOT\n");
    // after the run the program store is untouched
    s.enter("LIST");
    assert_eq!(s.output(), "");
}

#[test]
fn test_eeprom_array_pseudo_variable() {
    let mut s = Session::new();
    s.enter("@E(1)=31415");
    s.enter("PRINT @E(1)");
    assert_eq!(s.output(), "31415\n");
    s.enter("@E(999)=1");
    assert_eq!(s.output(), "Range Error\n");
}

#[test]
fn test_free_memory_array_pseudo_variable() {
    let mut s = Session::new();
    s.enter("@(1)=123");
    s.enter("PRINT @(1)");
    assert_eq!(s.output(), "123\n");
}

#[test]
fn test_stream_pseudo_variables() {
    let mut s = Session::new();
    s.enter("PRINT @I; @O");
    assert_eq!(s.output(), "1 1\n");
}

#[test]
fn test_trappable_error_is_writable() {
    let mut s = Session::new();
    s.enter("@S=7");
    s.enter("PRINT @S");
    assert_eq!(s.output(), "7\n");
}
