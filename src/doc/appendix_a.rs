/*!
# Errors

An error prints as the line number, a short message, and the word
`Error`:

```text
10: Div by 0 Error
```

Immediate statements print without the line prefix. After any error
the evaluation, `FOR` and `GOSUB` stacks are cleared, the stream
selections return to their defaults, and the interpreter is back at
the prompt; `CONT` afterwards starts from the beginning.

The messages: `Syntax`, `Number`, `Div by 0`, `Unknown Line`,
`Return`, `Next`, `GOSUB`, `FOR`, `Memory`, `Stack`, `DIM`, `Range`,
`String`, `Variable`, `File`, `Function`, `Args`, `EEPROM`,
`SD card`.

File and storage trouble is different: it never stops a program.
`OPEN`, `CLOSE`, `CATALOG`, `DELETE`, `SAVE` and `LOAD` record their
success in the trappable register instead, which a program reads as
`@S` (0 means success) and then decides for itself:

```text
10 OPEN "DATA", 0
20 IF @S<>0 THEN PRINT "NO FILE"
```

# Compatibility notes

Substring assignment keeps the tail of the old string when the stored
slice ends inside it, so `A$="HELLO" : A$(3)="XY"` gives `HEXYO`. The
classic Apple 1 interpreters truncated at the end of the slice
(`HEXY`); embedders can select that behaviour on the runtime.

`BREAK` leaves exactly one loop level. `FOR` loops with `STEP 0` spin
forever on purpose. A `NEXT` naming a different variable than the
innermost loop raises the `Next` error.
*/
