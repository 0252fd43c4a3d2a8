//! Main execution loop and command dispatch for the Aceto interpreter.
//!
//! Each step reads the cell under the instruction pointer, executes it (or
//! collects it into a literal), then advances: one-shot motions from
//! movement/mirror/jump commands win over the default advance along the
//! Hilbert curve. Running off either end of the curve terminates the
//! program; directional steps wrap toroidally instead.

use std::cmp::Ordering;
use std::time::Instant;

use aceto_common::{hilbert, Value};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{FromPrimitive, One, Pow, Signed, ToPrimitive, Zero};
use rand::Rng;
use regex::Regex;

use crate::error::{ProgramError, RuntimeError};
use crate::io::Io;
use crate::machine::{Interpreter, Mode, Motion};

impl<I: Io> Interpreter<I> {
    /// Execute until the program terminates: end of curve, `X`, or an
    /// uncaught error.
    pub fn run(&mut self) -> Result<(), ProgramError> {
        let result = self.drive();
        let _ = self.io.flush();
        result
    }

    fn drive(&mut self) -> Result<(), ProgramError> {
        while !self.done {
            self.step()?;
        }
        Ok(())
    }

    /// One dispatcher iteration: read, execute or collect, advance.
    pub fn step(&mut self) -> Result<(), ProgramError> {
        let c = self.grid.get(self.x, self.y);
        if self.mode != Mode::Command {
            self.collect_literal(c);
            return self.advance();
        }

        match self.exec(c) {
            Ok(()) => {
                // `.` repeats and must not shadow what it repeated.
                if c != '.' {
                    self.previous = c;
                }
            }
            Err(e) => {
                self.motion = None;
                self.skip = false;
                match self.catch {
                    Some((cx, cy)) if !self.opts.err_all => {
                        self.log(1, &format!("caught: {e}"));
                        self.x = cx;
                        self.y = cy;
                        return Ok(());
                    }
                    _ => {
                        return Err(ProgramError::Uncaught {
                            kind: e,
                            x: self.x,
                            y: self.y,
                        })
                    }
                }
            }
        }
        if self.done {
            return Ok(());
        }
        self.advance()
    }

    /// Feed one cell to the string/char literal collector.
    fn collect_literal(&mut self, c: char) {
        match self.mode {
            Mode::Str => match c {
                '"' => {
                    let s = std::mem::take(&mut self.buf);
                    self.push(Value::Str(s));
                    self.mode = Mode::Command;
                }
                '\\' => self.mode = Mode::StrEscape,
                _ => self.buf.push(c),
            },
            Mode::StrEscape => {
                self.buf.push(unescape(c));
                self.mode = Mode::Str;
            }
            Mode::Char => match c {
                '\\' => self.mode = Mode::CharEscape,
                _ => {
                    self.push(Value::Str(c.to_string()));
                    self.mode = Mode::Command;
                }
            },
            Mode::CharEscape => {
                self.push(Value::Str(unescape(c).to_string()));
                self.mode = Mode::Command;
            }
            Mode::Command => {}
        }
    }

    /// Move the instruction pointer: a pending one-shot motion if any,
    /// otherwise one cell along the curve. Consumes the skip flag by
    /// taking one extra (wrapping) curve step.
    fn advance(&mut self) -> Result<(), ProgramError> {
        let side = self.grid.side();
        match self.motion.take() {
            Some(Motion::Step(dx, dy)) => {
                let n = side as isize;
                self.x = (self.x as isize + dx).rem_euclid(n) as usize;
                self.y = (self.y as isize + dy).rem_euclid(n) as usize;
            }
            Some(Motion::Goto(x, y)) => {
                self.x = x;
                self.y = y;
            }
            None => {
                let d = hilbert::xy2d(side, self.x, self.y) as i64 + self.dir;
                if d < 0 || d >= self.grid.area() as i64 {
                    if self.mode != Mode::Command {
                        return Err(ProgramError::UnterminatedLiteral {
                            x: self.x,
                            y: self.y,
                        });
                    }
                    self.done = true;
                    return Ok(());
                }
                let (x, y) = hilbert::d2xy(side, d as usize);
                self.x = x;
                self.y = y;
            }
        }
        if self.skip {
            self.skip = false;
            let area = self.grid.area() as i64;
            let d = hilbert::xy2d(side, self.x, self.y) as i64;
            let (x, y) = hilbert::d2xy(side, (d + self.dir).rem_euclid(area) as usize);
            self.x = x;
            self.y = y;
        }
        Ok(())
    }

    /// Execute one command character. Unknown characters are no-ops.
    fn exec(&mut self, c: char) -> Result<(), RuntimeError> {
        if c != ' ' {
            self.log(2, &format!("{c} at ({}, {})", self.x, self.y));
        }
        match c {
            '0'..='9' => {
                self.push(Value::int(c as u32 - '0' as u32));
                Ok(())
            }
            '"' => {
                self.mode = Mode::Str;
                Ok(())
            }
            '\'' => {
                self.mode = Mode::Char;
                Ok(())
            }
            '\\' => {
                self.skip = true;
                Ok(())
            }
            '.' => {
                let prev = self.previous;
                self.exec(prev)
            }

            // Stack manipulation.
            's' => {
                self.store.swap();
                Ok(())
            }
            'd' => {
                self.store.dup();
                Ok(())
            }
            'h' => {
                self.store.head();
                Ok(())
            }
            'x' => {
                self.pop();
                Ok(())
            }
            'ø' => {
                self.store.clear();
                Ok(())
            }
            'U' => {
                self.store.reverse();
                Ok(())
            }
            'Q' => {
                self.store.rotate_up();
                Ok(())
            }
            'q' => {
                self.store.rotate_down();
                Ok(())
            }
            'Y' => {
                self.store.shuffle(&mut self.rng);
                Ok(())
            }
            'l' => {
                let n = self.store.len();
                self.push(Value::int(n));
                Ok(())
            }
            'C' => {
                let v = self.pop();
                let found = self.store.contains(&v);
                self.push(Value::Bool(found));
                Ok(())
            }
            '×' => self.exec_repeat_stack(),
            'k' => {
                self.store.set_sticky(true);
                Ok(())
            }
            'K' => {
                self.store.set_sticky(false);
                Ok(())
            }
            '(' => {
                self.store.shift_active(-1);
                Ok(())
            }
            ')' => {
                self.store.shift_active(1);
                Ok(())
            }
            '{' => {
                let v = self.pop();
                let left = self.store.active_index().wrapping_sub(1);
                self.store.push_to(left, v);
                Ok(())
            }
            '}' => {
                let v = self.pop();
                let right = self.store.active_index().wrapping_add(1);
                self.store.push_to(right, v);
                Ok(())
            }
            '[' => {
                let v = self.pop();
                self.store.shift_active(-1);
                self.push(v);
                Ok(())
            }
            ']' => {
                let v = self.pop();
                self.store.shift_active(1);
                self.push(v);
                Ok(())
            }
            'g' => self.exec_sort_two(true),
            'G' => self.exec_sort_two(false),

            // Arithmetic and logic.
            '+' => self.exec_add(),
            '-' => self.exec_minus_or_split(),
            '*' => self.exec_times(),
            '/' => self.exec_idiv_or_count(),
            ':' => self.exec_fdiv_or_split(),
            '%' => self.exec_mod_or_replace(),
            'F' => self.exec_pow_or_index(),
            '«' => self.exec_shift(true),
            '»' => self.exec_shift(false),
            'A' => self.exec_bitwise("and", |a, b| a & b),
            'V' => self.exec_bitwise("or", |a, b| a | b),
            'H' => self.exec_bitwise("xor", |a, b| a ^ b),
            'a' => self.exec_bitnot_or_findall(),
            '!' => {
                let v = self.pop();
                self.push(Value::Bool(!v.is_truthy()));
                Ok(())
            }
            '~' => self.exec_invert(),
            'y' => self.exec_sign(),
            '±' => self.exec_abs(),
            'I' => self.exec_increment(1),
            'D' => self.exec_increment(-1),
            '=' => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Bool(a.loose_eq(&b)));
                Ok(())
            }
            'm' => self.exec_compare(true),
            'w' => self.exec_compare(false),

            // Casts.
            'i' => self.exec_cast_int(),
            'f' => self.exec_cast_float(),
            'b' => {
                let v = self.pop();
                self.push(Value::Bool(v.is_truthy()));
                Ok(())
            }
            '∑' => {
                let v = self.pop();
                self.push(Value::Str(v.to_string()));
                Ok(())
            }
            'c' => {
                let v = self.pop();
                let s = v
                    .as_int()
                    .and_then(|n| n.to_u32())
                    .and_then(char::from_u32)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "\u{FFFD}".to_string());
                self.push(Value::Str(s));
                Ok(())
            }
            'o' => {
                let v = self.pop();
                let code = match &v {
                    Value::Str(s) => s.chars().next().map_or(0, |c| c as u32),
                    _ => 0,
                };
                self.push(Value::int(code));
                Ok(())
            }

            // Strings and ranges.
            'J' => {
                let b = self.pop();
                let a = self.pop();
                self.push(Value::Str(format!("{a}{b}")));
                Ok(())
            }
            '£' => {
                let joined = self
                    .store
                    .values()
                    .iter()
                    .rev()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.store.clear();
                self.push(Value::Str(joined));
                Ok(())
            }
            '€' => self.exec_explode(),
            'z' => self.exec_range_down(),
            'Z' => self.exec_range_up(),

            // Constants, time, randomness, quick memory, I/O.
            'P' => {
                self.push(Value::Float(std::f64::consts::PI));
                Ok(())
            }
            'e' => {
                self.push(Value::Float(std::f64::consts::E));
                Ok(())
            }
            'R' => {
                let r: f64 = self.rng.gen();
                self.push(Value::Float(r));
                Ok(())
            }
            'T' => {
                self.clock = Instant::now();
                Ok(())
            }
            't' => {
                self.push(Value::Float(self.clock.elapsed().as_secs_f64()));
                Ok(())
            }
            'τ' => self.exec_datetime(),
            'L' => {
                self.push(self.quick.clone());
                Ok(())
            }
            'M' => {
                self.quick = self.pop();
                Ok(())
            }
            'B' => {
                let s = self.quick.to_string();
                self.print(&s)
            }
            'p' => {
                let v = self.pop();
                self.print(&v.to_string())
            }
            'n' => self.print("\n"),
            'r' => self.exec_read_line(),
            ',' => self.exec_read_char(),

            // Movement, control flow, errors.
            '<' => {
                self.motion = Some(Motion::Step(-1, 0));
                Ok(())
            }
            '>' => {
                self.motion = Some(Motion::Step(1, 0));
                Ok(())
            }
            'v' => {
                self.motion = Some(Motion::Step(0, -1));
                Ok(())
            }
            '^' => {
                self.motion = Some(Motion::Step(0, 1));
                Ok(())
            }
            'W' | 'N' | 'E' | 'S' => self.exec_cardinal(c),
            'u' => {
                self.dir = -self.dir;
                Ok(())
            }
            '?' => {
                let dirs = [(1, 0), (-1, 0), (0, 1), (0, -1)];
                let (dx, dy) = dirs[self.rng.gen_range(0..dirs.len())];
                self.motion = Some(Motion::Step(dx, dy));
                Ok(())
            }
            '|' => self.exec_mirror(true, false),
            '_' => self.exec_mirror(false, true),
            '#' => self.exec_mirror(true, true),
            'O' => {
                self.motion = Some(if self.dir > 0 {
                    Motion::Goto(0, 0)
                } else {
                    Motion::Goto(self.grid.side() - 1, 0)
                });
                Ok(())
            }
            ';' => {
                self.motion = Some(if self.dir > 0 {
                    Motion::Goto(self.grid.side() - 1, 0)
                } else {
                    Motion::Goto(0, 0)
                });
                Ok(())
            }
            'j' => self.exec_jump(true),
            '§' => self.exec_jump(false),
            '`' => {
                let v = self.pop();
                if !v.is_truthy() {
                    self.skip = true;
                }
                Ok(())
            }
            'X' => {
                self.done = true;
                Ok(())
            }
            '@' => {
                self.catch = Some((self.x, self.y));
                Ok(())
            }
            '&' => Err(RuntimeError::UserRaised("raised an &rror".into())),
            '$' => {
                let v = self.pop();
                if v.is_truthy() {
                    Ok(())
                } else {
                    Err(RuntimeError::UserRaised("a$$ertion failed".into()))
                }
            }

            _ => Ok(()),
        }
    }

    // ---- Printing and reading ----

    fn print(&mut self, s: &str) -> Result<(), RuntimeError> {
        self.io.write_str(s).map_err(io_err)?;
        if self.opts.flush {
            self.io.flush().map_err(io_err)?;
        }
        Ok(())
    }

    fn exec_read_line(&mut self) -> Result<(), RuntimeError> {
        self.io.flush().map_err(io_err)?;
        match self.io.read_line().map_err(io_err)? {
            Some(line) => {
                self.push(Value::Str(line));
                Ok(())
            }
            None => Err(RuntimeError::Io("end of input".into())),
        }
    }

    fn exec_read_char(&mut self) -> Result<(), RuntimeError> {
        self.io.flush().map_err(io_err)?;
        let s = match self.io.read_char().map_err(io_err)? {
            None | Some('\r') => String::new(),
            Some(ch) => ch.to_string(),
        };
        self.push(Value::Str(s));
        Ok(())
    }

    // ---- Stack commands with value semantics ----

    fn exec_repeat_stack(&mut self) -> Result<(), RuntimeError> {
        let k = self.pop_int()?;
        let count = if k.is_negative() {
            0
        } else {
            k.to_usize()
                .ok_or_else(|| RuntimeError::TypeMismatch("repeat count too large".into()))?
        };
        self.store.repeat(count);
        Ok(())
    }

    /// `g`/`G`: order the two topmost values. `asc` leaves the larger on
    /// top (popping yields descending values), `!asc` the smaller.
    fn exec_sort_two(&mut self, asc: bool) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        let swapped = match order_of(&a, &b)? {
            Some(Ordering::Greater) => asc,
            Some(Ordering::Less) => !asc,
            _ => false,
        };
        if swapped {
            self.push(b);
            self.push(a);
        } else {
            self.push(a);
            self.push(b);
        }
        Ok(())
    }

    // ---- Arithmetic ----

    fn exec_add(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        if let (Value::Str(x), Value::Str(y)) = (&a, &b) {
            self.push(Value::Str(format!("{x}{y}")));
            return Ok(());
        }
        match numeric_pair(&a, &b) {
            Some(Numeric::Int(x, y)) => self.push(Value::Int(x + y)),
            Some(Numeric::Float(x, y)) => self.push(Value::Float(x + y)),
            None => return Err(type_mismatch("add", &a, &b)),
        }
        Ok(())
    }

    /// `-` splits a string on top into whitespace-separated parts (first
    /// part on top); otherwise numeric subtraction.
    fn exec_minus_or_split(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        if let Value::Str(s) = &b {
            let parts: Vec<&str> = s.split_whitespace().collect();
            for part in parts.into_iter().rev() {
                self.push(Value::Str(part.to_string()));
            }
            return Ok(());
        }
        let a = self.pop();
        match numeric_pair(&a, &b) {
            Some(Numeric::Int(x, y)) => self.push(Value::Int(x - y)),
            Some(Numeric::Float(x, y)) => self.push(Value::Float(x - y)),
            None => return Err(type_mismatch("subtract", &a, &b)),
        }
        Ok(())
    }

    fn exec_times(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        // String repetition works with the count on either side.
        let repetition = match (&a, &b) {
            (Value::Str(s), other) => other.as_int().map(|k| (s.clone(), k)),
            (other, Value::Str(s)) => other.as_int().map(|k| (s.clone(), k)),
            _ => None,
        };
        if let Some((s, k)) = repetition {
            let count = if k.is_negative() {
                0
            } else {
                k.to_usize()
                    .ok_or_else(|| RuntimeError::TypeMismatch("repeat count too large".into()))?
            };
            self.push(Value::Str(s.repeat(count)));
            return Ok(());
        }
        match numeric_pair(&a, &b) {
            Some(Numeric::Int(x, y)) => self.push(Value::Int(x * y)),
            Some(Numeric::Float(x, y)) => self.push(Value::Float(x * y)),
            None => return Err(type_mismatch("multiply", &a, &b)),
        }
        Ok(())
    }

    /// `/` counts regex matches of a pattern in a string; otherwise floor
    /// division (toward negative infinity, also for floats).
    fn exec_idiv_or_count(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        if let (Value::Str(target), Value::Str(pattern)) = (&a, &b) {
            let re = compile(pattern)?;
            let count = re.find_iter(target).count();
            self.push(Value::int(count));
            return Ok(());
        }
        match numeric_pair(&a, &b) {
            Some(Numeric::Int(x, y)) => {
                if y.is_zero() {
                    return Err(RuntimeError::DivideByZero);
                }
                self.push(Value::Int(x.div_floor(&y)));
            }
            Some(Numeric::Float(x, y)) => {
                if y == 0.0 {
                    return Err(RuntimeError::DivideByZero);
                }
                self.push(Value::Float((x / y).floor()));
            }
            None => return Err(type_mismatch("divide", &a, &b)),
        }
        Ok(())
    }

    /// `:` splits a string by a separator string; otherwise true division
    /// yielding a float.
    fn exec_fdiv_or_split(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        if let Value::Str(sep) = &b {
            let a = self.pop();
            let Value::Str(target) = &a else {
                return Err(type_mismatch("split", &a, &b));
            };
            if sep.is_empty() {
                return Err(RuntimeError::TypeMismatch("empty separator".into()));
            }
            let parts: Vec<&str> = target.split(sep.as_str()).collect();
            for part in parts.into_iter().rev() {
                self.push(Value::Str(part.to_string()));
            }
            return Ok(());
        }
        let a = self.pop();
        match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => {
                if y == 0.0 {
                    return Err(RuntimeError::DivideByZero);
                }
                self.push(Value::Float(x / y));
                Ok(())
            }
            _ => Err(type_mismatch("divide", &a, &b)),
        }
    }

    /// `%` substitutes regex matches when the top is a string (pop
    /// replacement, pattern, target); otherwise the floored remainder
    /// (sign of the divisor, also for floats).
    fn exec_mod_or_replace(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        if let Value::Str(replacement) = &b {
            let pattern = self.pop();
            let target = self.pop();
            let (Value::Str(p), Value::Str(t)) = (&pattern, &target) else {
                return Err(type_mismatch("substitute in", &target, &pattern));
            };
            let re = compile(p)?;
            let result = re.replace_all(t, replacement.as_str());
            self.push(Value::Str(result.into_owned()));
            return Ok(());
        }
        let a = self.pop();
        match numeric_pair(&a, &b) {
            Some(Numeric::Int(x, y)) => {
                if y.is_zero() {
                    return Err(RuntimeError::DivideByZero);
                }
                self.push(Value::Int(x.mod_floor(&y)));
            }
            Some(Numeric::Float(x, y)) => {
                if y == 0.0 {
                    return Err(RuntimeError::DivideByZero);
                }
                self.push(Value::Float(x - y * (x / y).floor()));
            }
            None => return Err(type_mismatch("take the remainder of", &a, &b)),
        }
        Ok(())
    }

    /// `F` indexes a string by an integer (negative counts from the end);
    /// otherwise exponentiation.
    fn exec_pow_or_index(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        if let (Value::Str(s), Some(i)) = (&a, b.as_int()) {
            let len = s.chars().count();
            let raw = i.to_i64().unwrap_or(i64::MAX);
            let idx = if raw < 0 { len as i64 + raw } else { raw };
            if idx < 0 || idx >= len as i64 {
                return Err(RuntimeError::IndexOutOfRange { index: raw, len });
            }
            let ch = s.chars().nth(idx as usize).unwrap_or('\u{FFFD}');
            self.push(Value::Str(ch.to_string()));
            return Ok(());
        }
        match numeric_pair(&a, &b) {
            Some(Numeric::Int(x, y)) => {
                if y.is_negative() {
                    let (xf, yf) = (x.to_f64().unwrap_or(f64::INFINITY), y.to_f64().unwrap_or(0.0));
                    self.push(Value::Float(xf.powf(yf)));
                } else {
                    let exp = y
                        .to_u64()
                        .ok_or_else(|| RuntimeError::TypeMismatch("exponent too large".into()))?;
                    self.push(Value::Int(Pow::pow(&x, exp)));
                }
            }
            Some(Numeric::Float(x, y)) => self.push(Value::Float(x.powf(y))),
            None => return Err(type_mismatch("exponentiate", &a, &b)),
        }
        Ok(())
    }

    fn exec_shift(&mut self, left: bool) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        let (Some(x), Some(y)) = (a.as_int(), b.as_int()) else {
            return Err(type_mismatch("shift", &a, &b));
        };
        if y.is_negative() {
            return Err(RuntimeError::TypeMismatch("negative shift count".into()));
        }
        let amount = y
            .to_usize()
            .ok_or_else(|| RuntimeError::TypeMismatch("shift count too large".into()))?;
        let result = if left { x << amount } else { x >> amount };
        self.push(Value::Int(result));
        Ok(())
    }

    fn exec_bitwise(
        &mut self,
        verb: &str,
        op: fn(BigInt, BigInt) -> BigInt,
    ) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) => {
                self.push(Value::Int(op(x, y)));
                Ok(())
            }
            _ => Err(type_mismatch(verb, &a, &b)),
        }
    }

    /// `a` is bitwise NOT on an integer, or regex find-all when the top is
    /// a string (pop pattern, pop target; first match ends on top).
    fn exec_bitnot_or_findall(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop();
        if let Value::Str(pattern) = &b {
            let a = self.pop();
            let Value::Str(target) = &a else {
                return Err(type_mismatch("search", &a, &b));
            };
            let re = compile(pattern)?;
            let matches: Vec<String> = re.find_iter(target).map(|m| m.as_str().to_string()).collect();
            for m in matches.into_iter().rev() {
                self.push(Value::Str(m));
            }
            return Ok(());
        }
        match b.as_int() {
            Some(n) => {
                self.push(Value::Int(-n - BigInt::one()));
                Ok(())
            }
            None => Err(RuntimeError::TypeMismatch(format!(
                "can't invert a {}",
                b.type_name()
            ))),
        }
    }

    /// `~` reverses a string, negates a boolean, bitwise-inverts an
    /// integer, arithmetically negates a float.
    fn exec_invert(&mut self) -> Result<(), RuntimeError> {
        let v = self.pop();
        let result = match v {
            Value::Str(s) => Value::Str(s.chars().rev().collect()),
            Value::Bool(b) => Value::Bool(!b),
            Value::Int(n) => Value::Int(-n - BigInt::one()),
            Value::Float(f) => Value::Float(-f),
        };
        self.push(result);
        Ok(())
    }

    fn exec_sign(&mut self) -> Result<(), RuntimeError> {
        let v = self.pop();
        let sign = match &v {
            Value::Int(n) => {
                if n.is_negative() {
                    -1
                } else if n.is_zero() {
                    0
                } else {
                    1
                }
            }
            Value::Float(f) => {
                if *f > 0.0 {
                    1
                } else if *f < 0.0 {
                    -1
                } else {
                    0
                }
            }
            Value::Bool(b) => i32::from(*b),
            Value::Str(_) => {
                return Err(RuntimeError::TypeMismatch(
                    "can't take the sign of a string".into(),
                ))
            }
        };
        self.push(Value::int(sign));
        Ok(())
    }

    fn exec_abs(&mut self) -> Result<(), RuntimeError> {
        let v = self.pop();
        let result = match v {
            Value::Int(n) => Value::Int(n.abs()),
            Value::Float(f) => Value::Float(f.abs()),
            Value::Bool(b) => Value::int(b as i64),
            Value::Str(_) => {
                return Err(RuntimeError::TypeMismatch(
                    "can't take the absolute value of a string".into(),
                ))
            }
        };
        self.push(result);
        Ok(())
    }

    /// `I`/`D`: add `delta` to a numeric value; anything else becomes
    /// integer 1.
    fn exec_increment(&mut self, delta: i64) -> Result<(), RuntimeError> {
        let v = self.pop();
        let result = match v {
            Value::Int(n) => Value::Int(n + delta),
            Value::Float(f) => Value::Float(f + delta as f64),
            Value::Bool(b) => Value::int(b as i64 + delta),
            Value::Str(_) => Value::int(1),
        };
        self.push(result);
        Ok(())
    }

    /// `m` pushes a > b, `w` pushes a ≤ b.
    fn exec_compare(&mut self, greater: bool) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        let ord = order_of(&a, &b)?;
        let result = if greater {
            matches!(ord, Some(Ordering::Greater))
        } else {
            matches!(ord, Some(Ordering::Less | Ordering::Equal))
        };
        self.push(Value::Bool(result));
        Ok(())
    }

    // ---- Casts ----

    fn exec_cast_int(&mut self) -> Result<(), RuntimeError> {
        let v = self.pop();
        let result = match &v {
            Value::Int(_) => v,
            Value::Bool(b) => Value::int(*b as i64),
            Value::Float(f) => BigInt::from_f64(f.trunc())
                .map(Value::Int)
                .unwrap_or_else(|| Value::int(0)),
            Value::Str(s) => s
                .trim()
                .parse::<BigInt>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::int(0)),
        };
        self.push(result);
        Ok(())
    }

    fn exec_cast_float(&mut self) -> Result<(), RuntimeError> {
        let v = self.pop();
        let result = match &v {
            Value::Float(_) => v,
            Value::Int(n) => Value::Float(n.to_f64().unwrap_or(0.0)),
            Value::Bool(b) => Value::Float(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => Value::Float(s.trim().parse::<f64>().unwrap_or(0.0)),
        };
        self.push(result);
        Ok(())
    }

    // ---- Strings and ranges ----

    fn exec_explode(&mut self) -> Result<(), RuntimeError> {
        let v = self.pop();
        let Value::Str(s) = &v else {
            return Err(RuntimeError::TypeMismatch(format!(
                "can't explode a {}",
                v.type_name()
            )));
        };
        for c in s.chars().rev() {
            self.push(Value::Str(c.to_string()));
        }
        Ok(())
    }

    /// `z`: push n…1 (1 on top), or n…−1 for negative n (−1 on top).
    fn exec_range_down(&mut self) -> Result<(), RuntimeError> {
        let n = self.pop_int()?;
        let one = BigInt::one();
        if n.is_positive() {
            let mut i = n;
            while i >= one {
                self.push(Value::Int(i.clone()));
                i -= &one;
            }
        } else if n.is_negative() {
            let minus_one = -one.clone();
            let mut i = n;
            while i <= minus_one {
                self.push(Value::Int(i.clone()));
                i += &one;
            }
        }
        Ok(())
    }

    /// `Z`: push 1…n (n on top), or −1…n counting down for negative n.
    fn exec_range_up(&mut self) -> Result<(), RuntimeError> {
        let n = self.pop_int()?;
        let one = BigInt::one();
        if n.is_positive() {
            let mut i = one.clone();
            while i <= n {
                self.push(Value::Int(i.clone()));
                i += &one;
            }
        } else if n.is_negative() {
            let mut i = -one.clone();
            while i >= n {
                self.push(Value::Int(i.clone()));
                i -= &one;
            }
        }
        Ok(())
    }

    // ---- Time ----

    /// `τ`: push second, minute, hour, day, month, year, with the year on top.
    fn exec_datetime(&mut self) -> Result<(), RuntimeError> {
        use chrono::{Datelike, Local, Timelike};
        let now = Local::now();
        self.push(Value::int(now.second()));
        self.push(Value::int(now.minute()));
        self.push(Value::int(now.hour()));
        self.push(Value::int(now.day()));
        self.push(Value::int(now.month()));
        self.push(Value::int(now.year()));
        Ok(())
    }

    // ---- Movement ----

    /// `W E S N` move like `< ^ > v` and rotate their own cell 90°
    /// clockwise, so the next visit moves in the rotated direction.
    fn exec_cardinal(&mut self, c: char) -> Result<(), RuntimeError> {
        let (motion, rotated) = match c {
            'W' => (Motion::Step(-1, 0), 'N'),
            'N' => (Motion::Step(0, 1), 'E'),
            'E' => (Motion::Step(1, 0), 'S'),
            'S' => (Motion::Step(0, -1), 'W'),
            _ => return Ok(()),
        };
        self.grid.set(self.x, self.y, rotated);
        self.motion = Some(motion);
        Ok(())
    }

    fn exec_mirror(&mut self, mirror_x: bool, mirror_y: bool) -> Result<(), RuntimeError> {
        let cond = self.pop();
        if cond.is_truthy() {
            let n = self.grid.side();
            let x = if mirror_x { n - 1 - self.x } else { self.x };
            let y = if mirror_y { n - 1 - self.y } else { self.y };
            self.log(2, &format!("mirroring to ({x}, {y})"));
            self.motion = Some(Motion::Goto(x, y));
        }
        Ok(())
    }

    /// `j` jumps k cells along the curve; `§` jumps to curve position k.
    /// Both wrap modulo the curve length.
    fn exec_jump(&mut self, relative: bool) -> Result<(), RuntimeError> {
        let k = self.pop_int()?;
        let area = BigInt::from(self.grid.area());
        let target = if relative {
            let d = BigInt::from(hilbert::xy2d(self.grid.side(), self.x, self.y));
            (d + k).mod_floor(&area)
        } else {
            k.mod_floor(&area)
        };
        let d = target.to_usize().unwrap_or(0);
        let (x, y) = hilbert::d2xy(self.grid.side(), d);
        self.motion = Some(Motion::Goto(x, y));
        Ok(())
    }

    // ---- Shared coercions ----

    fn pop_int(&mut self) -> Result<BigInt, RuntimeError> {
        let v = self.pop();
        v.as_int().ok_or_else(|| {
            RuntimeError::TypeMismatch(format!("can't use a {} as an integer", v.type_name()))
        })
    }
}

/// Both operands seen numerically: integer unless either side is a float.
enum Numeric {
    Int(BigInt, BigInt),
    Float(f64, f64),
}

fn numeric_pair(a: &Value, b: &Value) -> Option<Numeric> {
    match (a, b) {
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            Some(Numeric::Float(a.as_float()?, b.as_float()?))
        }
        _ => Some(Numeric::Int(a.as_int()?, b.as_int()?)),
    }
}

/// Ordering for `m`, `w`, `g`, `G`: numerics compare numerically, strings
/// lexicographically; comparing a string against a numeric is an error.
/// `None` only for unordered floats (NaN).
fn order_of(a: &Value, b: &Value) -> Result<Option<Ordering>, RuntimeError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::Str(_), _) | (_, Value::Str(_)) => Err(type_mismatch("compare", a, b)),
        (Value::Int(x), Value::Int(y)) => Ok(Some(x.cmp(y))),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
            _ => Err(type_mismatch("compare", a, b)),
        },
    }
}

fn type_mismatch(verb: &str, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch(format!(
        "can't {verb} {} and {}",
        a.type_name(),
        b.type_name()
    ))
}

fn compile(pattern: &str) -> Result<Regex, RuntimeError> {
    Regex::new(pattern).map_err(|e| RuntimeError::RegexSyntax(e.to_string()))
}

fn io_err(e: std::io::Error) -> RuntimeError {
    RuntimeError::Io(e.to_string())
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        other => other,
    }
}
