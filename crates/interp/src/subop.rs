//! Sub-opcode namespaces riding in `arg1` of `SYSIO`/`LIB`/`SETOP`/`FLOAT`/
//! `OSOP` (§3.1, §6.3). These are plain data: the mnemonic table the lister
//! prints from and the tag the interpreter's dispatch loop and [`crate::
//! host::Host`] trait switch on.

macro_rules! subop_enum {
    ($name:ident { $( $variant:ident = $code:literal, $mnemonic:literal; )* }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            pub const fn to_u8(self) -> u8 {
                match self {
                    $( $name::$variant => $code, )*
                }
            }

            pub fn from_u8(v: u8) -> Option<$name> {
                match v {
                    $( $code => Some($name::$variant), )*
                    _ => None,
                }
            }

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( $name::$variant => $mnemonic, )*
                }
            }
        }
    };
}

subop_enum!(SysIoOp {
    AllocFile = 0, "allocfile";
    FreeFile = 1, "freefile";
    Eof = 2, "eof";
    Eoln = 3, "eoln";
    FilePos = 4, "filepos";
    FileSize = 5, "filesize";
    Seek = 6, "seek";
    SeekEof = 7, "seekeof";
    SeekEoln = 8, "seekeoln";
    AssignFile = 9, "assignfile";
    Reset = 10, "reset";
    ResetR = 11, "resetr";
    Rewrite = 12, "rewrite";
    RewriteR = 13, "rewriter";
    Append = 14, "append";
    CloseFile = 15, "closefile";
    ReadLn = 16, "readln";
    ReadPg = 17, "readpg";
    ReadBin = 18, "readbin";
    ReadInt = 19, "readint";
    ReadChr = 20, "readchr";
    ReadStr = 21, "readstr";
    ReadSsr = 22, "readssr";
    ReadRl = 23, "readrl";
    WriteLn = 24, "writeln";
    WritePg = 25, "writepg";
    WriteBin = 26, "writebin";
    WriteInt = 27, "writeint";
    WriteWord = 28, "writeword";
    WriteLong = 29, "writelong";
    WriteULong = 30, "writeulong";
    WriteChr = 31, "writechr";
    WriteStr = 32, "writestr";
    WriteSsr = 33, "writessr";
    WriteRl = 34, "writerl";
    ChDir = 35, "chdir";
    MkDir = 36, "mkdir";
    RmDir = 37, "rmdir";
    GetDir = 38, "getdir";
    OpenDir = 39, "opendir";
    ReadDir = 40, "readdir";
    FileInfo = 41, "fileinfo";
    RewindDir = 42, "rewinddir";
    CloseDir = 43, "closedir";
});

subop_enum!(LibOp {
    StrCpy = 0, "strcpy";
    StrCpyX = 1, "strcpyx";
    SStrCpy = 2, "sstrcpy";
    SStrCpyX = 3, "sstrcpyx";
    Cnv2Ss = 4, "cnv2ss";
    CnvSs2 = 5, "cnvss2";
    StrInit = 6, "strinit";
    SStrInit = 7, "sstrinit";
    StrTmp = 8, "strtmp";
    StrDup = 9, "strdup";
    SStrDup = 10, "sstrdup";
    MkStkC = 11, "mkstkc";
    StrCat = 12, "strcat";
    SStrCat = 13, "sstrcat";
    StrCmp = 14, "strcmp";
    SStrCmp = 15, "sstrcmp";
    CopySubStr = 16, "copysubstr";
    FindSubStr = 17, "findsubstr";
    Val = 18, "val";
    CharAt = 19, "charat";
    StrLen = 20, "strlen";
    InsertStr = 21, "insertstr";
    DelSubStr = 22, "delsubstr";
    FillChar = 23, "fillchar";
});

subop_enum!(SetOp {
    Intersection = 0, "intersection";
    Union = 1, "union";
    Difference = 2, "difference";
    SymmetricDifference = 3, "symdifference";
    Equality = 4, "equ";
    Inequality = 5, "neq";
    Contains = 6, "contains";
    Member = 7, "member";
    Include = 8, "include";
    Exclude = 9, "exclude";
    Cardinality = 10, "cardinality";
    Singleton = 11, "singleton";
    Subrange = 12, "subrange";
});

subop_enum!(FloatOp {
    Float = 0, "float";
    Trunc = 1, "trunc";
    Round = 2, "round";
    Add = 3, "add";
    Sub = 4, "sub";
    Mul = 5, "mul";
    Div = 6, "div";
    Mod = 7, "mod";
    Equ = 8, "equ";
    Neq = 9, "neq";
    Lt = 10, "lt";
    Gte = 11, "gte";
    Gt = 12, "gt";
    Lte = 13, "lte";
    Neg = 14, "neg";
    Abs = 15, "abs";
    Sqr = 16, "sqr";
    Sqrt = 17, "sqrt";
    Sin = 18, "sin";
    Cos = 19, "cos";
    Atan = 20, "atan";
    Ln = 21, "ln";
    Exp = 22, "exp";
});

subop_enum!(OsOp {
    Exit = 0, "exit";
    New = 1, "new";
    Dispose = 2, "dispose";
    GetEnv = 3, "getenv";
    Spawn = 4, "spawn";
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        assert_eq!(SysIoOp::from_u8(SysIoOp::WriteLn.to_u8()), Some(SysIoOp::WriteLn));
        assert_eq!(OsOp::from_u8(OsOp::Spawn.to_u8()), Some(OsOp::Spawn));
        assert_eq!(FloatOp::from_u8(99), None);
    }
}
