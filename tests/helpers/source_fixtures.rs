//! Java source fixtures shared across the integration suites.

/// Declares `p.A` with a single no-arg method `foo`.
pub const A_JAVA: &str = "\
package p;

public class A {
    public static void foo() {
    }
}
";

/// Same file after renaming `foo` to `bar`.
pub const A_RENAMED: &str = "\
package p;

public class A {
    public static void bar() {
    }
}
";

/// Imports `p.A` and calls `A.foo()` three times.
pub const B_JAVA: &str = "\
package p;

import p.A;

public class B {
    void run() {
        A.foo();
        A.foo();
        A.foo();
    }
}
";

/// Unrelated file in another package; never a candidate for `p.A#foo`.
pub const C_JAVA: &str = "\
package q;

public class C {
    void other() {
    }
}
";

/// Two methods, only one of which mentions `foo` in its body.
pub const MIXED_BODIES: &str = "\
package p;

import p.A;

public class M {
    void uses() {
        A.foo();
    }

    void ignores() {
        int unrelated = 1;
    }
}
";

/// A field access left dangling at the cursor, mid-identifier.
pub const FOCUS_JAVA: &str = "\
package p;

public class C {
    int field;
    void m() {
        this.fi
    }
}
";

/// A string literal with no closing quote.
pub const BROKEN_JAVA: &str = "\
package p;

public class D {
    String s = \"unterminated
}
";

/// Wildcard import, flagged by the lint pass.
pub const WILDCARD_IMPORT_JAVA: &str = "\
package q;

import p.*;

public class W {
    void w() {
        A.foo();
    }
}
";
