use super::Address;

/// An interpreter error: a kind plus the line it happened in, when known.
///
/// Arithmetic, lexical and program-structure errors travel through this
/// type. Trappable I/O errors do not; they only set the `@S` register.
#[derive(Debug, PartialEq, Clone)]
pub struct Error {
    code: ErrorCode,
    line: Option<Address>,
}

#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::from_code($crate::lang::ErrorCode::$err)
    };
}

impl Error {
    pub fn from_code(code: ErrorCode) -> Error {
        Error { code, line: None }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn line(&self) -> Option<Address> {
        self.line
    }

    /// Stamps the line number a runtime error was raised in. Errors from
    /// immediate statements stay unstamped and print without a prefix.
    pub fn in_line(mut self, line: Address) -> Error {
        self.line = Some(line);
        self
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorCode {
    Unknown,
    Number,
    DivByZero,
    LineUnknown,
    Return,
    Next,
    Gosub,
    For,
    OutOfMemory,
    Stack,
    Dim,
    Range,
    String,
    Variable,
    File,
    Function,
    Args,
    Eeprom,
    SdCard,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ErrorCode::*;
        let s = match self {
            Unknown => "Syntax",
            Number => "Number",
            DivByZero => "Div by 0",
            LineUnknown => "Unknown Line",
            Return => "Return",
            Next => "Next",
            Gosub => "GOSUB",
            For => "FOR",
            OutOfMemory => "Memory",
            Stack => "Stack",
            Dim => "DIM",
            Range => "Range",
            String => "String",
            Variable => "Variable",
            File => "File",
            Function => "Function",
            Args => "Args",
            Eeprom => "EEPROM",
            SdCard => "SD card",
        };
        write!(f, "{}", s)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(line) = self.line {
            write!(f, "{}: ", line)?;
        }
        write!(f, "{} Error", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format() {
        let e = Error::from_code(ErrorCode::Unknown);
        assert_eq!(e.to_string(), "Syntax Error");
        let e = e.in_line(10);
        assert_eq!(e.to_string(), "10: Syntax Error");
    }
}
