//! Fixed schema description for the invoice analytics database.
//!
//! The five tables live in PostgreSQL with camelCase column names (a Prisma
//! convention inherited from the ingestion pipeline), so every mixed-case
//! identifier must be double-quoted in SQL. The prompt builder embeds
//! [`SCHEMA_TEXT`] verbatim; the identifier normalizer drives off
//! [`IDENTIFIER_MAP`] and [`KNOWN_COLUMNS`].

/// Schema text handed to the language model, as a plain column listing rather
/// than CREATE TABLE statements.
pub const SCHEMA_TEXT: &str = r#"Database: PostgreSQL. All mixed-case column names are camelCase and must be double-quoted (e.g. "totalAmount").

Table: vendors
  id            TEXT PRIMARY KEY
  name          TEXT NOT NULL
  address       TEXT
  "taxId"       TEXT
  "createdAt"   TIMESTAMP NOT NULL

Table: customers
  id            TEXT PRIMARY KEY
  name          TEXT NOT NULL
  address       TEXT
  "taxId"       TEXT
  "createdAt"   TIMESTAMP NOT NULL

Table: invoices
  id              TEXT PRIMARY KEY
  "invoiceNumber" TEXT NOT NULL UNIQUE
  "vendorId"      TEXT NOT NULL REFERENCES vendors(id)
  "customerId"    TEXT REFERENCES customers(id)
  "invoiceDate"   DATE NOT NULL
  "dueDate"       DATE
  subtotal        NUMERIC NOT NULL
  "taxAmount"     NUMERIC NOT NULL
  "totalAmount"   NUMERIC NOT NULL
  status          TEXT NOT NULL -- 'pending' | 'paid' | 'overdue'
  currency        TEXT NOT NULL -- ISO code, e.g. 'EUR'
  "paymentTerms"  TEXT
  category        TEXT
  description     TEXT
  "createdAt"     TIMESTAMP NOT NULL

Table: line_items
  id            TEXT PRIMARY KEY
  "invoiceId"   TEXT NOT NULL REFERENCES invoices(id)
  description   TEXT NOT NULL
  quantity      NUMERIC NOT NULL
  "unitPrice"   NUMERIC NOT NULL
  amount        NUMERIC NOT NULL
  "taxRate"     NUMERIC

Table: payments
  id                TEXT PRIMARY KEY
  "invoiceId"       TEXT NOT NULL REFERENCES invoices(id)
  "paymentDate"     DATE NOT NULL
  amount            NUMERIC NOT NULL
  "paymentMethod"   TEXT
  "referenceNumber" TEXT"#;

pub const TABLE_NAMES: [&str; 5] = [
    "vendors",
    "customers",
    "invoices",
    "line_items",
    "payments",
];

/// snake_case spellings the model tends to invent, mapped to the actual
/// camelCase column names. Replacement targets must stay disjoint from
/// replacement sources (no camel value may appear as a snake key) so the
/// rewrite is order-independent.
pub const IDENTIFIER_MAP: [(&str, &str); 16] = [
    ("invoice_number", "invoiceNumber"),
    ("vendor_id", "vendorId"),
    ("customer_id", "customerId"),
    ("invoice_id", "invoiceId"),
    ("invoice_date", "invoiceDate"),
    ("due_date", "dueDate"),
    ("tax_amount", "taxAmount"),
    ("total_amount", "totalAmount"),
    ("payment_terms", "paymentTerms"),
    ("tax_id", "taxId"),
    ("created_at", "createdAt"),
    ("unit_price", "unitPrice"),
    ("tax_rate", "taxRate"),
    ("payment_date", "paymentDate"),
    ("payment_method", "paymentMethod"),
    ("reference_number", "referenceNumber"),
];

/// Every column the quoting pass wraps in double quotes: the camelCase targets
/// of [`IDENTIFIER_MAP`] plus single-word columns that have no snake_case
/// spelling. A schema column missing from this list silently stays unquoted,
/// so additions to the schema must be mirrored here.
pub const KNOWN_COLUMNS: [&str; 22] = [
    "invoiceNumber",
    "vendorId",
    "customerId",
    "invoiceId",
    "invoiceDate",
    "dueDate",
    "taxAmount",
    "totalAmount",
    "paymentTerms",
    "taxId",
    "createdAt",
    "unitPrice",
    "taxRate",
    "paymentDate",
    "paymentMethod",
    "referenceNumber",
    "subtotal",
    "status",
    "quantity",
    "amount",
    "currency",
    "category",
];
