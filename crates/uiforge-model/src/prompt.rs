//! Prompt assembly.

use crate::attachment::{Attachment, AttachmentKind};
use crate::session::Part;

/// Default system instruction for component generation.
pub const SYSTEM_INSTRUCTION: &str = "\
You write single-file React components from UI descriptions.

Reply with the component source only, without explanations or markdown fences.
Export the component as the default export.
Import only from 'react' and 'lucide-react'; icons are named imports from 'lucide-react'.
Style with Tailwind CSS utility classes.
Keep the root element fluid (w-full max-w-full) and avoid fixed or absolute positioning at the root.
When asked to change an earlier component, return the complete updated component.";

const IMAGE_NOTE: &str = "If this image is a design mockup or screenshot, recreate it faithfully. \
If it is content imagery, work it into the design.";

/// Build the parts of a user turn from a prompt and its attachments.
///
/// Text attachments are inlined as delimited context blocks after the
/// prompt. Each image becomes an inline part preceded by a short note.
pub fn compose(prompt: &str, attachments: &[Attachment]) -> Vec<Part> {
    let mut text = prompt.trim().to_string();
    let mut images = Vec::new();

    for attachment in attachments {
        match &attachment.kind {
            AttachmentKind::Text(content) => {
                text.push_str(&format!(
                    "\n\n--- Context from {name} ---\n{content}\n--- End of {name} ---",
                    name = attachment.name,
                    content = content.trim_end()
                ));
            }
            AttachmentKind::Image { mime_type, .. } => {
                text.push_str(&format!(
                    "\n\n[Image attached: {}]\n{}",
                    attachment.name, IMAGE_NOTE
                ));
                if let Some(data) = attachment.encoded() {
                    images.push(Part::Image {
                        mime_type: mime_type.clone(),
                        data,
                    });
                }
            }
        }
    }

    let mut parts = vec![Part::Text(text)];
    parts.extend(images);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_prompt_is_a_single_part() {
        assert_eq!(
            compose("  a pricing table \n", &[]),
            vec![Part::Text("a pricing table".into())]
        );
    }

    #[test]
    fn text_attachments_are_inlined() {
        let parts = compose(
            "a landing page",
            &[Attachment::text("copy.txt", "Fresh bread daily\n")],
        );

        assert_eq!(
            parts,
            vec![Part::Text(
                "a landing page\n\n--- Context from copy.txt ---\nFresh bread daily\n--- End of copy.txt ---"
                    .into()
            )]
        );
    }

    #[test]
    fn images_become_inline_parts() {
        let parts = compose(
            "match this",
            &[Attachment::image("shot.png", "image/png", vec![1, 2, 3])],
        );

        assert_eq!(parts.len(), 2);
        match &parts[0] {
            Part::Text(text) => assert!(text.contains("[Image attached: shot.png]")),
            other => panic!("expected text, got {:?}", other),
        }
        assert_eq!(
            parts[1],
            Part::Image {
                mime_type: "image/png".into(),
                data: "AQID".into()
            }
        );
    }
}
