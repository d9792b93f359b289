//! Framework de testes do núcleo

use crate::core::logging;

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> (usize, usize, usize) {
    logging::emit_str("=== Executando suite: ");
    logging::emit_str(name);
    logging::emit_nl();

    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for test in tests {
        let result = (test.func)();
        match result {
            TestResult::Passed => {
                logging::emit_str("[PASS] ");
                passed += 1;
            }
            TestResult::Failed => {
                logging::emit_str("[FAIL] ");
                failed += 1;
            }
            TestResult::Skipped => {
                logging::emit_str("[SKIP] ");
                skipped += 1;
            }
        }
        logging::emit_str(test.name);
        logging::emit_nl();
    }

    logging::emit_str("Resultados: passed=");
    logging::emit_hex(passed as u64);
    logging::emit_nl();

    (passed, failed, skipped)
}
