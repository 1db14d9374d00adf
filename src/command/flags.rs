//! Argument-shape and context masks.

use bitflags::bitflags;

/// Highest fixed argument count expressible with `TAKEn`.
pub const MAX_TAKE: usize = 9;

bitflags! {
    /// Which argument counts a directive accepts, and whether it opens a block.
    ///
    /// Bit `n` of the low half means "exactly `n` arguments" (not counting the
    /// directive name), so shapes combine with `|`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArgShape: u32 {
        const NOARGS = 1 << 0;
        const TAKE1 = 1 << 1;
        const TAKE2 = 1 << 2;
        const TAKE3 = 1 << 3;
        const TAKE4 = 1 << 4;
        const TAKE5 = 1 << 5;
        const TAKE6 = 1 << 6;
        const TAKE7 = 1 << 7;
        const TAKE8 = 1 << 8;
        const TAKE9 = 1 << 9;

        const TAKE12 = Self::TAKE1.bits() | Self::TAKE2.bits();
        const TAKE13 = Self::TAKE1.bits() | Self::TAKE3.bits();
        const TAKE23 = Self::TAKE2.bits() | Self::TAKE3.bits();
        const TAKE123 = Self::TAKE1.bits() | Self::TAKE2.bits() | Self::TAKE3.bits();
        const TAKE1234 = Self::TAKE123.bits() | Self::TAKE4.bits();

        /// Directive must be followed by `{`.
        const BLOCK = 1 << 16;
        /// Exactly one `on`/`off` argument.
        const FLAG = 1 << 17;
        /// Any number of arguments, including none.
        const ANY = 1 << 18;
        const ONE_MORE = 1 << 19;
        const TWO_MORE = 1 << 20;

        /// Directive may appear at most once per context.
        const ONCE = 1 << 24;
    }
}

impl ArgShape {
    const COUNT_MASK: u32 = 0xffff;

    fn counts(self) -> u32 {
        self.bits() & Self::COUNT_MASK
    }

    fn counting(self) -> ArgShape {
        self & (ArgShape::FLAG | ArgShape::ANY | ArgShape::ONE_MORE | ArgShape::TWO_MORE)
    }

    /// Returns true if `n` arguments satisfy this shape.
    pub fn accepts(self, n: usize) -> bool {
        if self.contains(ArgShape::ANY) {
            true
        } else if self.contains(ArgShape::FLAG) {
            n == 1
        } else if self.contains(ArgShape::ONE_MORE) {
            n >= 1
        } else if self.contains(ArgShape::TWO_MORE) {
            n >= 2
        } else {
            n <= MAX_TAKE && self.counts() & (1u32 << n) != 0
        }
    }

    /// Human-readable description of the accepted counts.
    pub fn expected(self) -> String {
        if self.contains(ArgShape::ANY) {
            return "any number".to_string();
        }
        if self.contains(ArgShape::FLAG) {
            return "1 (on or off)".to_string();
        }
        if self.contains(ArgShape::ONE_MORE) {
            return "at least 1".to_string();
        }
        if self.contains(ArgShape::TWO_MORE) {
            return "at least 2".to_string();
        }

        let mut counts: Vec<String> = (0..=MAX_TAKE)
            .filter(|n| self.counts() & (1u32 << *n) != 0)
            .map(|n| n.to_string())
            .collect();
        match counts.pop() {
            None => "none".to_string(),
            Some(last) if counts.is_empty() => last,
            Some(last) => format!("{} or {}", counts.join(", "), last),
        }
    }

    /// Check the shape is internally consistent.
    pub fn validate(self) -> Result<(), String> {
        let counting = self.counting();
        if counting.bits().count_ones() > 1 {
            return Err("conflicting argument-count flags".to_string());
        }
        if !counting.is_empty() && self.counts() != 0 {
            return Err("fixed argument counts combined with FLAG/ANY/1MORE/2MORE".to_string());
        }
        if counting.is_empty() && self.counts() == 0 {
            return Err("no argument count declared".to_string());
        }
        if self.counts() >> (MAX_TAKE + 1) != 0 {
            return Err(format!("argument counts above {} are not supported", MAX_TAKE));
        }
        Ok(())
    }
}

bitflags! {
    /// Set of nesting contexts a directive is legal in.
    ///
    /// `MAIN` is the top level. Modules declare their own context types as
    /// single bits, e.g. `Contexts::from_bits_retain(1 << 1)`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Contexts: u32 {
        const MAIN = 1 << 0;
        const ANY = !0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_exact() {
        for n in 1..=MAX_TAKE {
            let shape = ArgShape::from_bits_retain(1 << n);
            assert!(shape.validate().is_ok());
            assert!(shape.accepts(n));
            assert!(!shape.accepts(n - 1));
            assert!(!shape.accepts(n + 1));
        }

        assert_eq!(ArgShape::TAKE8.bits(), 0x100);
        assert_eq!(ArgShape::TAKE9.bits(), 0x200);
        assert!(ArgShape::TAKE9.accepts(9));
        assert_eq!(ArgShape::TAKE8.expected(), "8");
        assert!(ArgShape::from_bits_retain(1 << 10).validate().is_err());
    }

    #[test]
    fn test_noargs_and_combinations() {
        assert!(ArgShape::NOARGS.accepts(0));
        assert!(!ArgShape::NOARGS.accepts(1));

        assert!(ArgShape::TAKE12.accepts(1));
        assert!(ArgShape::TAKE12.accepts(2));
        assert!(!ArgShape::TAKE12.accepts(3));
        assert_eq!(ArgShape::TAKE12.expected(), "1 or 2");
        assert_eq!(ArgShape::TAKE123.expected(), "1, 2 or 3");

        // BLOCK and ONCE bits do not affect counting
        let shape = ArgShape::TAKE1 | ArgShape::BLOCK | ArgShape::ONCE;
        assert!(shape.accepts(1));
        assert!(!shape.accepts(0));
    }

    #[test]
    fn test_open_ended() {
        assert!(ArgShape::ONE_MORE.accepts(5));
        assert!(!ArgShape::ONE_MORE.accepts(0));
        assert!(ArgShape::TWO_MORE.accepts(2));
        assert!(!ArgShape::TWO_MORE.accepts(1));
        assert!(ArgShape::ANY.accepts(0));
        assert!(ArgShape::FLAG.accepts(1));
        assert!(!ArgShape::FLAG.accepts(2));
    }

    #[test]
    fn test_validate() {
        assert!(ArgShape::TAKE1.validate().is_ok());
        assert!((ArgShape::NOARGS | ArgShape::BLOCK).validate().is_ok());
        assert!((ArgShape::FLAG | ArgShape::TAKE1).validate().is_err());
        assert!((ArgShape::ANY | ArgShape::ONE_MORE).validate().is_err());
        assert!(ArgShape::BLOCK.validate().is_err());
    }

    #[test]
    fn test_custom_context_bits() {
        const SERVER: Contexts = Contexts::from_bits_retain(1 << 2);
        let mask = Contexts::MAIN | SERVER;
        assert!(mask.contains(SERVER));
        assert!(!Contexts::MAIN.contains(SERVER));
        assert!(Contexts::ANY.contains(SERVER));
    }
}
