//! The closed catalog of functions callable from expressions.
//!
//! Each entry is the POSIX sh definition of a function with the same name,
//! emitted once into the generated script when anything calls it.

use std::fmt;

/// How many arguments a function accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Arity {
        Arity {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: usize) -> Arity {
        Arity { min: n, max: None }
    }

    pub fn accepts(self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max.is_none() {
            f.write_str("at least ")?;
        }
        let plural = if self.min == 1 { "" } else { "s" };
        write!(f, "{} argument{plural}", self.min)
    }
}

#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    /// Shell source of the definition, terminated by a newline.
    pub snippet: &'static str,
}

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

pub static BUILTINS: phf::Map<&'static str, Builtin> = phf::phf_map! {
    "os" => Builtin {
        name: "os",
        arity: Arity::exactly(0),
        snippet: OS,
    },
    "os_family" => Builtin {
        name: "os_family",
        arity: Arity::exactly(0),
        snippet: OS_FAMILY,
    },
    "arch" => Builtin {
        name: "arch",
        arity: Arity::exactly(0),
        snippet: ARCH,
    },
    "env_var_or_default" => Builtin {
        name: "env_var_or_default",
        arity: Arity::exactly(2),
        snippet: ENV_VAR_OR_DEFAULT,
    },
    "env_var" => Builtin {
        name: "env_var",
        arity: Arity::exactly(1),
        snippet: ENV_VAR,
    },
    "invocation_directory" => Builtin {
        name: "invocation_directory",
        arity: Arity::exactly(0),
        snippet: INVOCATION_DIRECTORY,
    },
    "invocation_directory_native" => Builtin {
        name: "invocation_directory_native",
        arity: Arity::exactly(0),
        snippet: INVOCATION_DIRECTORY_NATIVE,
    },
    "just_executable" => Builtin {
        name: "just_executable",
        arity: Arity::exactly(0),
        snippet: JUST_EXECUTABLE,
    },
    "justfile" => Builtin {
        name: "justfile",
        arity: Arity::exactly(0),
        snippet: JUSTFILE,
    },
    "justfile_directory" => Builtin {
        name: "justfile_directory",
        arity: Arity::exactly(0),
        snippet: JUSTFILE_DIRECTORY,
    },
    "sha256_file" => Builtin {
        name: "sha256_file",
        arity: Arity::exactly(1),
        snippet: SHA256_FILE,
    },
    "sha256" => Builtin {
        name: "sha256",
        arity: Arity::exactly(1),
        snippet: SHA256,
    },
    "uuid" => Builtin {
        name: "uuid",
        arity: Arity::exactly(0),
        snippet: UUID,
    },
    "error" => Builtin {
        name: "error",
        arity: Arity::exactly(1),
        snippet: ERROR,
    },
    "path_exists" => Builtin {
        name: "path_exists",
        arity: Arity::exactly(1),
        snippet: PATH_EXISTS,
    },
    "join" => Builtin {
        name: "join",
        arity: Arity::at_least(1),
        snippet: JOIN,
    },
    "quote" => Builtin {
        name: "quote",
        arity: Arity::exactly(1),
        snippet: QUOTE,
    },
    "uppercase" => Builtin {
        name: "uppercase",
        arity: Arity::exactly(1),
        snippet: UPPERCASE,
    },
    "lowercase" => Builtin {
        name: "lowercase",
        arity: Arity::exactly(1),
        snippet: LOWERCASE,
    },
};

/// Reports the status of the command substitution that just failed.
pub const BACKTICK_ERROR: &str = r#"backtick_error() {
  STATUS="${?}"
  echo_error "Backtick failed with exit code ${STATUS}"
  exit "${STATUS}"
}
"#;

/// Implements `/`. A separator already ending the left operand is reused.
pub const PATH_JOIN: &str = r#"path_join() {
  case "${1}" in
  */)
    printf "%s%s" "${1}" "${2}"
    ;;
  *)
    printf "%s/%s" "${1}" "${2}"
    ;;
  esac
}
"#;

const OS: &str = r#"os() {
  case "$(uname -s | tr '[:upper:]' '[:lower:]')" in
  *darwin*)
    echo "macos"
    ;;
  *linux*)
    echo "linux"
    ;;
  *windows*|*msys*)
    echo "windows"
    ;;
  *)
    echo "unknown"
    ;;
  esac
}
"#;

const OS_FAMILY: &str = r#"os_family() {
  case "$(uname -s | tr '[:upper:]' '[:lower:]')" in
  *windows*|*msys*)
    echo "windows"
    ;;
  *)
    echo "unix"
    ;;
  esac
}
"#;

const ARCH: &str = r#"arch() {
  case "$(uname -m | tr '[:upper:]' '[:lower:]')" in
  *aarch64*|*armv[8-9]*)
    echo "aarch64"
    ;;
  *aarch32*|*arm*)
    echo "arm"
    ;;
  *mips*)
    echo "mips"
    ;;
  *powerpc64*|*ppc64*)
    echo "powerpc64"
    ;;
  *powerpc*|*ppc*)
    echo "powerpc"
    ;;
  *s390*)
    echo "s390x"
    ;;
  *sparc*)
    echo "sparc"
    ;;
  *86_64*)
    echo "x86_64"
    ;;
  *86*)
    echo "x86"
    ;;
  *)
    echo "unix"
    ;;
  esac
}
"#;

const ENV_VAR_OR_DEFAULT: &str = r#"env_var_or_default() {
  VARSTR="$(
    sh -c 'set -u; echo "${'"${1}"'}"' 2> /dev/null \
      || echo "${1}=${2}"
  )"
  echo "${VARSTR}" \
    | sed 's/^[^=][^=]*=\(.*\)$/\1/'
}
"#;

const ENV_VAR: &str = r#"env_var() {
  sh -c 'set -u; echo "${'"${1}"'}"' 2> /dev/null || (
    echo_error "Call to function "'`env_var`'" failed: environment variable "'`'"${1}"'`'" not present"
    exit 1
  ) || exit "${?}"
}
"#;

const INVOCATION_DIRECTORY: &str = r#"invocation_directory() {
  realpath "${INVOCATION_DIRECTORY}"
}
"#;

const INVOCATION_DIRECTORY_NATIVE: &str = r#"invocation_directory_native() {
  realpath "${INVOCATION_DIRECTORY}"
}
"#;

const JUST_EXECUTABLE: &str = r#"just_executable() {
  realpath "${0}"
}
"#;

const JUSTFILE: &str = r#"justfile() {
  realpath "${0}"
}
"#;

const JUSTFILE_DIRECTORY: &str = r#"justfile_directory() {
  realpath "$(dirname "${0}")"
}
"#;

const SHA256_FILE: &str = r#"sha256_file() {
  if type sha256sum > /dev/null 2>&1; then
    sha256sum --binary "${1}" | cut -d ' ' -f 1
  elif type python3 > /dev/null 2>&1; then
    python3 -c 'from hashlib import sha256; import sys; print(sha256(sys.stdin.buffer.read()).hexdigest())' \
      < "${1}"
  elif type python > /dev/null 2>&1; then
    python -c 'from hashlib import sha256; import sys; print sha256(sys.stdin.read()).hexdigest()' \
      < "${1}"
  else
    echo_error "No sha256sum binary found"
    exit 1
  fi
}
"#;

const SHA256: &str = r#"sha256() {
  if type sha256sum > /dev/null 2>&1; then
    printf "%s" "${1}" | sha256sum --binary | cut -d ' ' -f 1
  elif type python3 > /dev/null 2>&1; then
    printf "%s" "${1}" | \
      python3 -c 'from hashlib import sha256; import sys; print(sha256(sys.stdin.buffer.read()).hexdigest())'
  elif type python > /dev/null 2>&1; then
    printf "%s" "${1}" | \
      python3 -c 'from hashlib import sha256; import sys; print sha256(sys.stdin.read()).hexdigest()'
  else
    echo_error "No sha256sum binary found"
    exit 1
  fi
}
"#;

const UUID: &str = r#"random_hex_bytes() {
  RANDOM_SOURCE="/dev/urandom"
  if ! [ -e "${RANDOM_SOURCE}" ]; then
    RANDOM_SOURCE="/dev/random"
    if [ -e "${RANDOM_SOURCE}" ]; then
      echo "${YELLOW}warning${NOCOLOR}: only pseudo-randomness available" >&2
    else
      echo_error "No randomness available"
      exit 1
    fi
  fi
  head -c "${1}" "${RANDOM_SOURCE}" \
    | od -t x1 \
    | head -n -1 \
    | cut -d ' ' -f 2- \
    | tr -d ' \n'
}

uuid() {
  (
    if [ -e /proc/sys/kernel/random/uuid ]; then
      cat /proc/sys/kernel/random/uuid
    elif type uuidgen > /dev/null 2>&1; then
      uuidgen
    elif type python3 > /dev/null 2>&1; then
      python3 -c 'import uuid; print(uuid.uuid4())'
    elif type python2 > /dev/null 2>&1; then
      python2 -c 'import uuid; print uuid.uuid4()'
    else
      VARIANT_BYTE="$(random_hex_bytes 1)"
      while ! echo "${VARIANT_BYTE}" | grep '^[89ab].$' > /dev/null; do
        VARIANT_BYTE="$(random_hex_bytes 1)"
      done
      MATCH='^\(........\)\(....\).\(...\)..\(..\)\(............\)$'
      NEW_PATTERN='\1-\2-4\3-'"${VARIANT_BYTE}"'\4-\5\n'
      random_hex_bytes 16 \
        | sed "s/${MATCH}/${NEW_PATTERN}/"
    fi
  ) | tr '[:upper:]' '[:lower:]'
}
"#;

const ERROR: &str = r#"error() {
  echo_error "Call to function "'`error`'" failed: ${*:-}"
  exit 1
}
"#;

const PATH_EXISTS: &str = r#"path_exists() {
  test -e "${1}" && echo "true" || echo "false"
}
"#;

const JOIN: &str = r#"join() {
  # No special Windows support means no support for Windows path separators
  printf "%s/" "${@}" | sed 's:/$::'
}
"#;

const QUOTE: &str = r#"quote() {
  printf "'"
  printf "%s" "${1}" | sed "s/'/'\\\\''/g"
  printf "'"
}
"#;

const UPPERCASE: &str = r#"uppercase() {
  echo "${1}" | tr '[:lower:]' '[:upper:]'
}
"#;

const LOWERCASE: &str = r#"lowercase() {
  echo "${1}" | tr '[:upper:]' '[:lower:]'
}
"#;
