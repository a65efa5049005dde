//! Lifetime-tied linear tokens and the strong/weak record counters.
//!
//! Every counted handle carries one token minted by the counter it
//! increments. Dropping a token panics; the only valid way to dispose of
//! it is to return it to the originating counter via `Count::put`. This
//! turns a missing decrement (or a double one) into a loud failure instead
//! of a silently wrong count.

use core::cell::Cell;
use core::marker::PhantomData;

/// Zero-sized, linear token tied to its originating counter type.
pub struct Token<'a, C: ?Sized> {
    _lt: PhantomData<&'a ()>,
    _ctr: PhantomData<*const C>,
}

impl<'a, C: ?Sized> Token<'a, C> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            _lt: PhantomData,
            _ctr: PhantomData,
        }
    }
}

impl<'a, C: ?Sized> Drop for Token<'a, C> {
    fn drop(&mut self) {
        panic!("Token dropped without Count::put");
    }
}

/// A source of counted references, enforced by linear Token flow.
pub trait Count {
    /// The token type minted by this counter.
    type Token<'a>: Sized
    where
        Self: 'a;

    /// Acquire one counted reference and return a linear token for it.
    fn get(&self) -> Self::Token<'static>;

    /// Return (consume) a previously acquired token.
    /// Returns true if the count is now zero.
    fn put<'a>(&'a self, t: Self::Token<'a>) -> bool;

    /// Current number of outstanding tokens.
    fn value(&self) -> usize;
}

/// Single-threaded counter shared by the strong and weak flavors.
#[derive(Debug, Default)]
struct UsizeCount {
    count: Cell<usize>,
}

impl UsizeCount {
    #[inline]
    fn inc(&self) {
        let n = self.count.get().wrapping_add(1);
        self.count.set(n);
        if n == 0 {
            // Same policy as Rc: overflow aborts.
            std::process::abort();
        }
    }

    #[inline]
    fn dec(&self, what: &str) -> bool {
        let c = self.count.get();
        assert!(c > 0, "{what} count underflow");
        self.count.set(c - 1);
        c == 1
    }
}

macro_rules! record_counter {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name(UsizeCount);

        impl Count for $name {
            type Token<'a>
                = Token<'a, Self>
            where
                Self: 'a;

            #[inline]
            fn get(&self) -> Self::Token<'static> {
                self.0.inc();
                Token::<'static, Self>::new()
            }

            #[inline]
            fn put<'a>(&'a self, t: Self::Token<'a>) -> bool {
                // Disarm before the underflow check so a failed assert does
                // not double-panic in the token's Drop.
                core::mem::forget(t);
                self.0.dec($what)
            }

            #[inline]
            fn value(&self) -> usize {
                self.0.count.get()
            }
        }
    };
}

record_counter!(
    /// Number of strong handles referencing a record.
    StrongCount,
    "strong"
);
record_counter!(
    /// Number of weak handles referencing a record.
    WeakCount,
    "weak"
);

pub(crate) type StrongToken = Token<'static, StrongCount>;
pub(crate) type WeakToken = Token<'static, WeakCount>;
