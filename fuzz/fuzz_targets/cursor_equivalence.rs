#![no_main]

use avl_set::model::CursorEquivalenceInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorEquivalenceInput| {
    avl_set::model::run_cursor_equivalence(input.values, input.ops);
});
