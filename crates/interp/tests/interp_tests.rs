//! Behavioural tests for the Aceto interpreter, driven through in-memory
//! I/O. Programs are either written as 2D grids (when the layout matters)
//! or laid out along the Hilbert curve with `along_curve` so a command
//! sequence can be given linearly.

use aceto_common::hilbert;
use aceto_interp::{run, MemIo, Options, ProgramError, RuntimeError};

// ============================================================
// Helper functions
// ============================================================

/// Lay a command sequence out along the Hilbert curve of the smallest
/// grid that holds it, so `cmds[i]` executes at step `i`.
fn along_curve(cmds: &str) -> String {
    let chars: Vec<char> = cmds.chars().collect();
    let mut side = 2usize;
    while side * side < chars.len() {
        side *= 2;
    }
    let mut rows = vec![vec![' '; side]; side];
    for (d, &c) in chars.iter().enumerate() {
        let (x, y) = hilbert::d2xy(side, d);
        rows[y][x] = c;
    }
    rows.iter()
        .rev()
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run a source text with empty input and return its output.
fn output_of(source: &str) -> String {
    let mut io = MemIo::new("");
    run(source, Options::default(), &mut io).expect("program failed");
    io.output
}

/// Run a command sequence (laid out along the curve) and return output.
fn eval(cmds: &str) -> String {
    output_of(&along_curve(cmds))
}

/// Run a command sequence with scripted input.
fn eval_with_input(cmds: &str, input: &str) -> String {
    let mut io = MemIo::new(input);
    run(&along_curve(cmds), Options::default(), &mut io).expect("program failed");
    io.output
}

/// Run a command sequence and return the terminating error.
fn eval_err(cmds: &str) -> ProgramError {
    let mut io = MemIo::new("");
    run(&along_curve(cmds), Options::default(), &mut io)
        .expect_err("program should have failed")
}

// ============================================================
// Literals and printing
// ============================================================

#[test]
fn digits_push_and_add() {
    assert_eq!(eval("32+p"), "5");
}

#[test]
fn subtraction_pops_in_order() {
    // Pops 3 then 7, computes 7 - 3.
    assert_eq!(eval("73-p"), "4");
}

#[test]
fn string_literal_collects_along_the_walk() {
    assert_eq!(eval("\"hi\"p"), "hi");
}

#[test]
fn string_literal_escapes() {
    assert_eq!(eval("\"a\\nb\"p"), "a\nb");
    assert_eq!(eval("\"a\\tb\"p"), "a\tb");
    assert_eq!(eval("\"a\\\"b\"p"), "a\"b");
    assert_eq!(eval("\"a\\\\b\"p"), "a\\b");
}

#[test]
fn unknown_escape_drops_the_backslash() {
    assert_eq!(eval("\"a\\qb\"p"), "aqb");
}

#[test]
fn char_literal() {
    assert_eq!(eval("'ap"), "a");
    assert_eq!(eval("'\\np"), "\n");
    assert_eq!(eval("''p"), "'");
}

#[test]
fn newline_command() {
    assert_eq!(eval("5pn"), "5\n");
}

#[test]
fn unterminated_string_exits_2() {
    let mut io = MemIo::new("");
    let err = run("\"a", Options::default(), &mut io).expect_err("should fail");
    assert!(matches!(err, ProgramError::UnterminatedLiteral { .. }));
    assert_eq!(err.exit_code(), 2);
}

// ============================================================
// Arithmetic
// ============================================================

#[test]
fn multiplication() {
    assert_eq!(eval("67*p"), "42");
}

#[test]
fn division_floors_toward_negative_infinity() {
    assert_eq!(eval("92/p"), "4");
    assert_eq!(eval("07-2/p"), "-4");
}

#[test]
fn float_division_floors_too() {
    assert_eq!(eval("5f2/p"), "2.0");
}

#[test]
fn true_division_yields_float() {
    assert_eq!(eval("12:p"), "0.5");
}

#[test]
fn remainder_takes_sign_of_divisor() {
    assert_eq!(eval("73%p"), "1");
    assert_eq!(eval("07-3%p"), "2");
}

#[test]
fn divide_by_zero_is_an_error() {
    let err = eval_err("10/");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::DivideByZero,
            ..
        }
    ));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn modulo_by_zero_is_an_error() {
    let err = eval_err("10%");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::DivideByZero,
            ..
        }
    ));
}

#[test]
fn exponentiation() {
    assert_eq!(eval("25Fp"), "32");
}

#[test]
fn negative_exponent_goes_float() {
    assert_eq!(eval("201-Fp"), "0.5");
}

#[test]
fn exponentiation_is_arbitrary_precision() {
    assert_eq!(
        eval("99F9Fp"),
        "196627050475552913618075908526912116283103450944214766927315415537966391196809"
    );
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    assert_eq!(eval("5f2+p"), "7.0");
}

#[test]
fn booleans_count_as_integers_in_arithmetic() {
    assert_eq!(eval("1b5+p"), "6");
}

#[test]
fn adding_a_string_to_a_number_is_a_type_mismatch() {
    let err = eval_err("5'a+");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::TypeMismatch(_),
            ..
        }
    ));
}

#[test]
fn increment_and_decrement() {
    assert_eq!(eval("5Ip"), "6");
    assert_eq!(eval("5Dp"), "4");
    // Non-numerics become integer 1.
    assert_eq!(eval("'aIp"), "1");
}

#[test]
fn sign_and_absolute_value() {
    assert_eq!(eval("07-yp"), "-1");
    assert_eq!(eval("0yp"), "0");
    assert_eq!(eval("5yp"), "1");
    assert_eq!(eval("07-±p"), "7");
    assert_eq!(eval("5f~±p"), "5.0");
}

#[test]
fn bitwise_operations() {
    assert_eq!(eval("63Ap"), "2");
    assert_eq!(eval("63Vp"), "7");
    assert_eq!(eval("63Hp"), "5");
    assert_eq!(eval("5ap"), "-6");
}

#[test]
fn shifts() {
    assert_eq!(eval("14«p"), "16");
    assert_eq!(eval("91»p"), "4");
}

#[test]
fn logical_negation() {
    assert_eq!(eval("0!p"), "True");
    assert_eq!(eval("5!p"), "False");
    assert_eq!(eval("\"\"!p"), "True");
}

#[test]
fn tilde_inverts_by_type() {
    assert_eq!(eval("5~p"), "-6");
    assert_eq!(eval("5~~p"), "5");
    assert_eq!(eval("\"ab\"~p"), "ba");
    assert_eq!(eval("\"ab\"~~p"), "ab");
    assert_eq!(eval("1b~p"), "False");
    assert_eq!(eval("5f~p"), "-5.0");
}

// ============================================================
// Comparisons and equality
// ============================================================

#[test]
fn equality_is_numeric_across_cases() {
    assert_eq!(eval("11=p"), "True");
    assert_eq!(eval("1f1=p"), "True");
    assert_eq!(eval("12=p"), "False");
    assert_eq!(eval("'1 1=p"), "False");
}

#[test]
fn greater_and_less_or_equal() {
    assert_eq!(eval("73mp"), "True");
    assert_eq!(eval("37mp"), "False");
    assert_eq!(eval("73wp"), "False");
    assert_eq!(eval("33wp"), "True");
    assert_eq!(eval("\"a\"\"b\"wp"), "True");
}

// ============================================================
// Casts
// ============================================================

#[test]
fn cast_to_integer() {
    assert_eq!(eval("5fip"), "5");
    assert_eq!(eval("\"42\"ip"), "42");
    assert_eq!(eval("\"x\"ip"), "0");
    assert_eq!(eval("1bip"), "1");
}

#[test]
fn cast_to_float() {
    assert_eq!(eval("5fp"), "5.0");
    assert_eq!(eval("\"2.5\"fp"), "2.5");
    assert_eq!(eval("\"x\"fp"), "0.0");
}

#[test]
fn cast_to_boolean_and_string() {
    assert_eq!(eval("5bp"), "True");
    assert_eq!(eval("0bp"), "False");
    assert_eq!(eval("5∑\"!\"+p"), "5!");
    assert_eq!(eval("1b∑p"), "True");
}

#[test]
fn chr_and_ord_roundtrip() {
    assert_eq!(eval("65cp"), "A");
    assert_eq!(eval("'Aop"), "65");
    assert_eq!(eval("65cop"), "65");
}

#[test]
fn chr_of_an_invalid_scalar_is_replacement_char() {
    // 27 << 11 = 55296, a surrogate.
    assert_eq!(eval("93*92+«cop"), "65533");
}

#[test]
fn ord_of_empty_or_non_string_is_zero() {
    assert_eq!(eval("\"\"op"), "0");
    assert_eq!(eval("5op"), "0");
}

// ============================================================
// Stack manipulation
// ============================================================

#[test]
fn swap_dup_drop() {
    assert_eq!(eval("12spp"), "12");
    assert_eq!(eval("5dpp"), "55");
    assert_eq!(eval("12xp"), "1");
}

#[test]
fn head_keeps_top_only() {
    assert_eq!(eval("123hlp"), "1");
    assert_eq!(eval("123hp"), "3");
}

#[test]
fn clear_stack() {
    assert_eq!(eval("123ølp"), "0");
}

#[test]
fn reverse_stack() {
    assert_eq!(eval("123Uppp"), "123");
}

#[test]
fn rotations() {
    assert_eq!(eval("123Qppp"), "132");
    assert_eq!(eval("123qppp"), "213");
}

#[test]
fn length_pushes_count() {
    assert_eq!(eval("5zlp"), "5");
    assert_eq!(eval("lp"), "0");
}

#[test]
fn contains_pops_the_needle() {
    assert_eq!(eval("1232Cp"), "True");
    assert_eq!(eval("1235Cp"), "False");
}

#[test]
fn repeat_stack_multiplies_length() {
    assert_eq!(eval("122×lp"), "4");
    assert_eq!(eval("120×lp"), "0");
}

#[test]
fn sticky_stack_pops_without_removing() {
    assert_eq!(eval("1kpp"), "11");
    assert_eq!(eval("1kKpp"), "10");
}

#[test]
fn sort_two() {
    assert_eq!(eval("13gpp"), "31");
    assert_eq!(eval("31gpp"), "31");
    assert_eq!(eval("13Gpp"), "13");
}

#[test]
fn stack_family_navigation() {
    // `}` pushes to the right neighbour, `)` moves there.
    assert_eq!(eval("5}6)pp"), "50");
    // `]` pops, moves right, pushes.
    assert_eq!(eval("5]p"), "5");
    // `(`/`[` mirror to the left.
    assert_eq!(eval("5[p"), "5");
    assert_eq!(eval("5{6(pp"), "50");
}

// ============================================================
// Strings and ranges
// ============================================================

#[test]
fn join_uses_canonical_forms() {
    assert_eq!(eval("5\"x\"Jp"), "5x");
    assert_eq!(eval("\"ab\"\"cd\"+p"), "abcd");
    assert_eq!(eval("\"ab\"3*p"), "ababab");
}

#[test]
fn explode_puts_first_char_on_top() {
    assert_eq!(eval("\"abc\"€ppp"), "abc");
}

#[test]
fn implode_joins_top_to_bottom() {
    assert_eq!(eval("123£p"), "3 2 1");
    assert_eq!(eval("123£lp"), "1");
}

#[test]
fn split_on_whitespace() {
    assert_eq!(eval("\"a b\"-pp"), "ab");
}

#[test]
fn split_on_separator() {
    assert_eq!(eval("\"a,b\"\",\":pp"), "ab");
}

#[test]
fn regex_count_matches() {
    assert_eq!(eval("\"abcabc\"\"bc\"/p"), "2");
    assert_eq!(eval("\"abc\"\"x\"/p"), "0");
}

#[test]
fn regex_replace() {
    assert_eq!(eval("\"axbxc\"\"x\"\"-\"%p"), "a-b-c");
}

#[test]
fn regex_findall_first_match_on_top() {
    assert_eq!(eval("\"a1b22\"\"[0-9]+\"app"), "122");
}

#[test]
fn bad_regex_raises() {
    let err = eval_err("\"a\"\"[\"/");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::RegexSyntax(_),
            ..
        }
    ));
}

#[test]
fn string_indexing() {
    assert_eq!(eval("\"abc\"1Fp"), "b");
    assert_eq!(eval("\"abc\"01-Fp"), "c");
}

#[test]
fn string_index_out_of_range() {
    let err = eval_err("\"abc\"5F");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::IndexOutOfRange { index: 5, len: 3 },
            ..
        }
    ));
}

#[test]
fn range_down() {
    assert_eq!(eval("3zppp"), "123");
    assert_eq!(eval("03-zppp"), "-1-2-3");
    assert_eq!(eval("0zlp"), "0");
}

#[test]
fn range_up() {
    assert_eq!(eval("3Zppp"), "321");
    assert_eq!(eval("03-Zppp"), "-3-2-1");
}

// ============================================================
// Quick memory, constants, time, randomness
// ============================================================

#[test]
fn quick_memory_store_and_load() {
    assert_eq!(eval("5MLLpp"), "55");
    assert_eq!(eval("5MBp"), "50");
}

#[test]
fn quick_memory_starts_as_empty_string() {
    assert_eq!(eval("L\"x\"Jp"), "x");
}

#[test]
fn pi_and_euler() {
    assert_eq!(eval("Pp"), "3.141592653589793");
    assert_eq!(eval("ep"), "2.718281828459045");
}

#[test]
fn elapsed_time_is_a_small_float() {
    let out = eval("Ttp");
    let secs: f64 = out.parse().expect("t should print a float");
    assert!((0.0..60.0).contains(&secs));
}

#[test]
fn datetime_pushes_year_on_top() {
    let out = eval("τp");
    let year: i32 = out.parse().expect("τ should leave the year on top");
    assert!(year >= 2020);
}

#[test]
fn random_float_is_deterministic_under_a_seed() {
    let opts = Options {
        seed: Some(42),
        ..Options::default()
    };
    let mut a = MemIo::new("");
    let mut b = MemIo::new("");
    run(&along_curve("RpRp"), opts.clone(), &mut a).expect("run");
    run(&along_curve("RpRp"), opts, &mut b).expect("run");
    assert_eq!(a.output, b.output);
    assert!(a.output.starts_with("0."));
}

#[test]
fn shuffle_is_deterministic_under_a_seed() {
    let opts = Options {
        seed: Some(7),
        ..Options::default()
    };
    let mut a = MemIo::new("");
    let mut b = MemIo::new("");
    run(&along_curve("9zYpppppppppX"), opts.clone(), &mut a).expect("run");
    run(&along_curve("9zYpppppppppX"), opts, &mut b).expect("run");
    assert_eq!(a.output, b.output);
    assert_eq!(a.output.len(), 9);
}

#[test]
fn random_direction_terminates() {
    let mut io = MemIo::new("");
    run(&along_curve("?"), Options::default(), &mut io).expect("run");
}

// ============================================================
// I/O commands
// ============================================================

#[test]
fn read_line_strips_newline() {
    assert_eq!(eval_with_input("rp", "hello\n"), "hello");
}

#[test]
fn read_line_at_eof_is_an_io_error() {
    let mut io = MemIo::new("");
    let err = run(&along_curve("r"), Options::default(), &mut io)
        .expect_err("read at EOF should fail");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::Io(_),
            ..
        }
    ));
}

#[test]
fn read_char_one_scalar_at_a_time() {
    assert_eq!(eval_with_input(",p,p", "ab"), "ab");
}

#[test]
fn read_char_maps_carriage_return_to_empty() {
    assert_eq!(eval_with_input(",p", "\r"), "");
}

#[test]
fn read_char_at_eof_pushes_empty_string() {
    assert_eq!(eval_with_input(",bp", ""), "False");
}

// ============================================================
// Movement and control flow
// ============================================================

#[test]
fn skip_jumps_over_the_next_cell() {
    assert_eq!(eval("5\\Xp"), "5");
}

#[test]
fn conditional_skip() {
    // Truthy: backtick is a no-op.
    assert_eq!(eval("1`5p"), "5");
    assert_eq!(eval("1`X5p"), "");
    // Falsy: behaves like `\`.
    assert_eq!(eval("0`X5p"), "5");
}

#[test]
fn exit_command_stops_immediately() {
    assert_eq!(eval("5pX5p"), "5");
}

#[test]
fn reverse_direction_walks_backward() {
    assert_eq!(eval("1pu"), "10");
}

#[test]
fn jump_relative_moves_along_the_curve() {
    assert_eq!(eval("2jX5pX"), "5");
}

#[test]
fn jump_absolute_lands_on_a_curve_index() {
    assert_eq!(eval("9§       7pX"), "7");
}

#[test]
fn jump_to_curve_end() {
    let cmds = format!("5;{}p", " ".repeat(13));
    assert_eq!(eval(&cmds), "5");
}

#[test]
fn step_overrides_wrap_toroidally() {
    // `<` at x = 0 wraps to the right edge.
    assert_eq!(output_of("<p"), "0");
    // `v` at y = 0 wraps to the top edge.
    assert_eq!(output_of("5p\nvX"), "5");
}

#[test]
fn east_override_skips_the_curve_order() {
    assert_eq!(output_of("5X\n>p"), "0");
}

#[test]
fn horizontal_mirror_on_truthy() {
    assert_eq!(output_of("X|p\n11"), "1");
    assert_eq!(output_of("X|p\n10"), "");
}

#[test]
fn vertical_mirror_on_truthy() {
    assert_eq!(output_of(" p\nX_\n11"), "1");
}

#[test]
fn double_mirror_on_truthy() {
    assert_eq!(output_of("  p\nX#\n11"), "1");
}

#[test]
fn cardinal_rotates_its_own_cell() {
    // `W` moves west like `<`, then the cell becomes `N`, letting the
    // walk escape upward on the second visit.
    let cmds = format!("1W{}ppX", " ".repeat(11));
    assert_eq!(eval(&cmds), "11");
}

// ============================================================
// Errors and the catch cell
// ============================================================

#[test]
fn catch_cell_resumes_execution() {
    // Divides by zero once, teleports back to `@`, then the emptied
    // stack makes the backtick skip the division and print a recovery 0.
    assert_eq!(eval("10@l`/pX"), "0");
}

#[test]
fn err_all_ignores_the_catch_cell() {
    let opts = Options {
        err_all: true,
        ..Options::default()
    };
    let mut io = MemIo::new("");
    let err = run(&along_curve("10@l`/pX"), opts, &mut io).expect_err("should die");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::DivideByZero,
            ..
        }
    ));
}

#[test]
fn uncaught_error_reports_the_offending_cell() {
    // `/` sits at curve step 2, which is cell (1, 1).
    let err = eval_err("10/");
    assert_eq!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::DivideByZero,
            x: 1,
            y: 1,
        }
    );
}

#[test]
fn raise_command_errors() {
    let err = eval_err("&");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::UserRaised(_),
            ..
        }
    ));
}

#[test]
fn assert_passes_on_truthy_and_raises_on_falsy() {
    assert_eq!(eval("1$5p"), "5");
    let err = eval_err("0$");
    assert!(matches!(
        err,
        ProgramError::Uncaught {
            kind: RuntimeError::UserRaised(_),
            ..
        }
    ));
}

// ============================================================
// Repeat (`.`)
// ============================================================

#[test]
fn dot_repeats_the_previous_command() {
    assert_eq!(eval("1d.ppp"), "111");
}

#[test]
fn dot_is_not_stored_as_previous() {
    // Two dots both repeat the dup, not each other.
    assert_eq!(eval("1d..pppp"), "1111");
}

#[test]
fn dot_after_a_string_literal_reopens_string_mode() {
    assert_eq!(eval("\"a\".b\"pp"), "ba");
}

// ============================================================
// Whole-program scenarios
// ============================================================

#[test]
fn two_dimensional_program_with_override() {
    let source = "5+24\n*cp+\n6+ v\n37 p";
    assert_eq!(output_of(source), "A6");
}

#[test]
fn hello_program_with_escape_in_string() {
    let source = "\"p\nn\n\\i\n\"H";
    assert_eq!(output_of(source), "Hi\n");
}

#[test]
fn unknown_characters_are_no_ops() {
    assert_eq!(eval("5☺♥p"), "5");
}
