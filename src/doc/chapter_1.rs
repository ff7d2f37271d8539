/*!
# The Language

## Statements

The Palo Alto core: `PRINT`, `LET` (the word itself is optional),
`INPUT`, `GOTO`, `GOSUB`/`RETURN`, `IF ... THEN`, `FOR ... TO ...
STEP` with `NEXT`, `STOP`/`END`, `LIST`, `NEW`, `RUN`, `REM`.

The Apple 1 additions: `DIM` for arrays and strings, `CLR`, `TAB n`,
`POKE a, v`. On top of those: `CONT`, `BREAK` (leave the innermost
loop), `DUMP` (raw memory), `SAVE`/`LOAD`, `GET`/`PUT` (single
characters), `SET` (interpreter switches), `CLS`, and the storage
statements `CATALOG`, `DELETE`, `OPEN`, `CLOSE`. The hardware
statements `PINM`, `DWRITE`, `AWRITE`, `DELAY`, `ATONE` and `CALL`
parse everywhere and do what the platform allows, which on a terminal
is nothing except `DELAY`.

Several statements fit on one line, separated by colons. `IF` guards
the rest of its line: on a false condition everything after it is
skipped. After `THEN` a bare number means `GOTO` that line.

## Expressions

Operators, loosest first: `OR`, `AND`, `NOT`, the relations `= <> < >
<= >=`, then `+ -`, then `* / %`. Relations and the logical operators
return 1 or 0. `%` is the integer remainder; division by zero is an
error.

Functions: `ABS(x)`, `SGN(x)`, `RND(x)` (0 up to x), `SQR(x)`,
`LEN(s$)`, `PEEK(a)` (negative addresses read the EEPROM image),
`FRE(0)`, `USR(f, a)` for interpreter introspection, and the nullary
`SIZE`, `LOMEM`, `HIMEM`. The board functions `AREAD`, `DREAD`,
`PULSEIN`, `AZERO` and `MILLIS(n)` exist; only `MILLIS` measures
anything on a terminal.

## Strings

`A$` holds up to its `DIM`ed capacity, default allocation happens at
first assignment through `DIM`. A substring is `A$(start)` or
`A$(start, end)`, usable on both sides of `=`:

```text
> A$="HELLO"
> A$(3)="XY"
> PRINT A$
HEXYO
```

Strings compare with `=` and `<>`. In a numeric spot a string is the
code of its first character, 0 when empty.

## The @ variables

Names starting with `@` reach into the interpreter: `@S` the trappable
error, `@I`/`@O` the input/output stream selections, `@C` a
non-blocking character, `@R` the random seed, `@X`/`@Y` the cursor,
`@E()` the EEPROM as an array, `@D()` the display cells, `@()` free
memory as an array, and `@$` the input buffer.
*/
