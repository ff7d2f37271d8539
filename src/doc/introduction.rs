/*!
# Introductory Tutorial

Open a terminal and run the executable. If you get the following, you
have achieved success and are ready for this tutorial. Type CTRL-D to
exit.
<pre><code>&nbsp;  Tiny BASIC 0.9.0 Memory 60000 1024
&nbsp;> █
</code></pre>

Stop a running program with CTRL-C, or by typing `#` when it reads
input.

When you see the `>` prompt, the interpreter is ready for a statement.
A statement typed on its own executes immediately:

<pre><code>&nbsp;> PRINT "HELLO"
&nbsp;  HELLO
</code></pre>

Precede the statement with a line number between 1 and 65535 and it is
stored instead. Stored lines form the program, kept sorted by their
numbers no matter the order you type them in. `LIST` prints the
program back, `RUN` executes it, `NEW` erases it. Typing a bare line
number deletes that line.

<pre><code>&nbsp;> 10 FOR I=1 TO 3
&nbsp;> 20 PRINT I
&nbsp;> 30 NEXT I
&nbsp;> RUN
&nbsp;  1
&nbsp;  2
&nbsp;  3
</code></pre>

Variables are a letter, or a letter and a digit; `A$` names a string,
`A(` an array. Strings and arrays beyond the 26 one-letter scalars
must be declared with `DIM`. Everything is an integer.

`SAVE "NAME"` writes the program as plain text, `LOAD "NAME"` reads it
back; `SAVE "!"` stores it into the EEPROM image instead, and
`SET 1,1` arranges for that image to run at the next start.
*/
