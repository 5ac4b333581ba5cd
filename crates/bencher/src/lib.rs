/// A named binding workload.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    form: TestForm,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, form: TestForm) -> Self {
        Self { name, group, form }
    }

    pub fn flat(name: &'static str, form: TestForm) -> Self {
        Self::new(name, TestGroup::Flat, form)
    }

    pub fn nested(name: &'static str, form: TestForm) -> Self {
        Self::new(name, TestGroup::Nested, form)
    }

    pub fn collection(name: &'static str, form: TestForm) -> Self {
        Self::new(name, TestGroup::Collection, form)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn form(&self) -> &TestForm {
        &self.form
    }

    pub fn file_name(&self) -> &'static str {
        self.form().file_name
    }
}

/// An `application/x-www-form-urlencoded` payload loaded from `resources/form`.
#[derive(Debug, Copy, Clone)]
pub struct TestForm {
    file_name: &'static str,
    content: &'static str,
}

impl TestForm {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    /// The payload without the trailing newline of the resource file.
    pub fn content(&self) -> &'static str {
        self.content.trim_end()
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// Number of `key=value` pairs in the payload.
    pub fn pairs(&self) -> usize {
        self.content().split('&').filter(|pair| !pair.is_empty()).count()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    /// Scalar parameters only.
    Flat,
    /// One complex parameter a few levels deep.
    Nested,
    /// A complex parameter dominated by one large indexed collection.
    Collection,
}
